//! Resource-path parsing: `Things`, `Things(1)`, `Things(1)/Datastreams`,
//! `Datastreams(1)/Thing`.

use sta_common::EntityId;
use sta_model::EntityKind;

use crate::error::{ApiError, ApiResult};

/// The target of a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Collection(EntityKind),
    Entity(EntityKind, EntityId),
    /// Entities related to one parent. `single` marks a to-one segment
    /// such as `Datastreams(1)/Thing`.
    Related {
        parent: EntityKind,
        parent_id: EntityId,
        child: EntityKind,
        single: bool,
    },
}

/// Split `Things(5)` into the set name and the identifier.
fn split_segment(segment: &str) -> Option<(&str, Option<EntityId>)> {
    let Some(open) = segment.find('(') else {
        return Some((segment, None));
    };
    let name = &segment[..open];
    let raw = segment[open + 1..].strip_suffix(')')?;
    let raw = raw
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    Some((name, Some(EntityId::new(raw))))
}

fn public_kind(kind: EntityKind) -> Option<EntityKind> {
    kind.collection().map(|_| kind)
}

pub fn parse(path: &str) -> ApiResult<Resource> {
    let unknown = || ApiError::UnknownPath(path.to_string());
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let (set, id) = split_segment(segments[0]).ok_or_else(unknown)?;
    let kind = EntityKind::from_collection(set).ok_or_else(unknown)?;

    match (id, segments.get(1), segments.len()) {
        (None, None, 1) => Ok(Resource::Collection(kind)),
        (Some(id), None, 1) => Ok(Resource::Entity(kind, id)),
        (Some(parent_id), Some(segment), 2) => {
            let (child, single) = match EntityKind::from_collection(segment) {
                Some(child) => (child, false),
                None => {
                    let child = EntityKind::from_name(segment)
                        .and_then(public_kind)
                        .ok_or_else(unknown)?;
                    (child, true)
                }
            };
            Ok(Resource::Related {
                parent: kind,
                parent_id,
                child,
                single,
            })
        }
        _ => Err(unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_and_entity() {
        assert_eq!(
            parse("Things").unwrap(),
            Resource::Collection(EntityKind::Thing)
        );
        assert_eq!(
            parse("/Sensors(42)").unwrap(),
            Resource::Entity(EntityKind::Sensor, EntityId::new("42"))
        );
        assert_eq!(
            parse("Locations('home-1')").unwrap(),
            Resource::Entity(EntityKind::Location, EntityId::new("home-1"))
        );
    }

    #[test]
    fn test_navigation_segments() {
        assert_eq!(
            parse("Things(1)/Datastreams").unwrap(),
            Resource::Related {
                parent: EntityKind::Thing,
                parent_id: EntityId::new("1"),
                child: EntityKind::Datastream,
                single: false,
            }
        );
        assert_eq!(
            parse("Observations(7)/FeatureOfInterest").unwrap(),
            Resource::Related {
                parent: EntityKind::Observation,
                parent_id: EntityId::new("7"),
                child: EntityKind::FeatureOfInterest,
                single: true,
            }
        );
    }

    #[test]
    fn test_unknown_paths() {
        for path in [
            "Gadgets",
            "Datasets(1)",
            "Things()",
            "Things(1)/Format",
            "Things(1)/Datastreams(2)/Observations",
            "Things/Datastreams",
        ] {
            assert!(parse(path).is_err(), "{} should not parse", path);
        }
    }
}
