use sta_common::{EntityId, StaError, StaResult};
use sta_filter::builder::{column, eq, literal};
use sta_model::{EntityKind, ObservedProperty, ObservedPropertyPayload};
use tracing::debug;

use super::datastream::{self, Owner};
use crate::cascade;
use crate::context::Context;
use crate::service::{claim_id, reference, reject_nested_bodies, require, EntityService};

#[derive(Debug, Default, Clone, Copy)]
pub struct ObservedPropertyService;

impl EntityService for ObservedPropertyService {
    type Entity = ObservedProperty;
    type Payload = ObservedPropertyPayload;

    /// Without an explicit identifier, a definition URI that is already
    /// registered resolves to the existing ObservedProperty.
    fn create(
        &self,
        ctx: &mut Context<'_>,
        payload: ObservedPropertyPayload,
    ) -> StaResult<EntityId> {
        if let Some(id) = reference::<ObservedProperty>(ctx, &payload)? {
            return Ok(id);
        }
        let ObservedPropertyPayload {
            id,
            name,
            definition,
            description,
            properties,
            datastreams,
        } = payload;

        let name = require(name, EntityKind::ObservedProperty, "name")?;
        let definition = require(definition, EntityKind::ObservedProperty, "definition")?;
        let description = require(description, EntityKind::ObservedProperty, "description")?;

        let existing = match id {
            None => ctx
                .tx
                .find_one::<ObservedProperty>(&eq(column("definition"), literal(definition.as_str())))
                .map(|p| p.id.clone()),
            Some(_) => None,
        };
        let id = match existing {
            Some(existing) => {
                debug!(observed_property = %existing, "Reusing observed property by definition");
                existing
            }
            None => {
                let id = claim_id::<ObservedProperty>(ctx, id)?;
                ctx.tx.save(ObservedProperty {
                    id: id.clone(),
                    name,
                    definition,
                    description,
                    properties,
                });
                debug!(observed_property = %id, "Created observed property");
                id
            }
        };

        datastream::attach(
            ctx,
            Owner::ObservedProperty,
            &id,
            datastreams.unwrap_or_default(),
        )?;
        Ok(id)
    }

    fn merge(
        &self,
        ctx: &mut Context<'_>,
        id: &EntityId,
        patch: ObservedPropertyPayload,
    ) -> StaResult<()> {
        let mut property = ctx.tx.get::<ObservedProperty>(id)?.clone();
        reject_nested_bodies(EntityKind::ObservedProperty, &patch)?;
        if patch.datastreams.is_some() {
            return Err(StaError::invalid(
                "Datastreams cannot be changed through an ObservedProperty patch",
            ));
        }

        if let Some(name) = patch.name {
            property.name = name;
        }
        if let Some(definition) = patch.definition {
            property.definition = definition;
        }
        if let Some(description) = patch.description {
            property.description = description;
        }
        if let Some(properties) = patch.properties {
            property.properties = Some(properties);
        }
        ctx.tx.save(property);
        Ok(())
    }

    fn delete(&self, ctx: &mut Context<'_>, id: &EntityId) -> StaResult<()> {
        cascade::delete_observed_property(ctx, id)
    }
}
