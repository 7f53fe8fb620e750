//! Effect dispatch.
//!
//! `execute` runs one effect against the context target; `execute_batch`
//! runs it over a frozen target set. Neither returns an error: executor
//! failures are logged at the severity their class calls for and the
//! effect moves on.

use crate::core::{EffectError, ObjectId};
use crate::scripting::ScriptingContext;

use super::accounting::{AccountingLedger, EffectCause};
use super::batch::{self, ExecutionFilter};
use super::effect::Effect;
use super::executors::notify::SitRep;
use super::executors::{create, empire, meters, modify, movement, notify};

impl Effect {
    /// Apply this effect to `ctx.target`.
    pub fn execute(&self, ctx: &mut ScriptingContext<'_>) {
        if let Err(err) = self.try_execute(ctx) {
            err.log(self.name());
        }
    }

    fn try_execute(&self, ctx: &mut ScriptingContext<'_>) -> Result<(), EffectError> {
        match self {
            Self::NoOp => Ok(()),

            Self::SetMeter { meter, value, .. } => meters::set_meter(ctx, *meter, value).map(drop),
            Self::SetPartMeter {
                meter,
                part_name,
                value,
            } => meters::set_part_meter(ctx, *meter, part_name, value),
            Self::SetEmpireMeter { empire, meter, value } => {
                meters::set_empire_meter(ctx, empire, meter, value)
            }
            Self::SetEmpireStockpile {
                empire,
                resource,
                value,
            } => meters::set_empire_stockpile(ctx, empire, *resource, value),

            Self::SetEmpireCapital { empire } => modify::set_empire_capital(ctx, empire),
            Self::SetPlanetType { planet_type } => modify::set_planet_type(ctx, planet_type),
            Self::SetPlanetSize { size } => modify::set_planet_size(ctx, size),
            Self::SetSpecies { species } => modify::set_species(ctx, species),
            Self::SetOwner { empire } => modify::set_owner(ctx, empire),
            Self::SetStarType { star_type } => modify::set_star_type(ctx, star_type),
            Self::SetSpeciesEmpireOpinion {
                species,
                empire,
                opinion,
            } => modify::set_species_empire_opinion(ctx, species, empire, opinion),
            Self::SetSpeciesSpeciesOpinion {
                opinionated_species,
                rated_species,
                opinion,
            } => modify::set_species_species_opinion(ctx, opinionated_species, rated_species, opinion),

            Self::CreatePlanet {
                planet_type,
                size,
                name,
                effects_after,
            } => create::create_planet(ctx, planet_type, size, name.as_ref(), effects_after),
            Self::CreateBuilding {
                building_type,
                name,
                effects_after,
            } => create::create_building(ctx, building_type, name.as_ref(), effects_after),
            Self::CreateShip {
                design,
                empire,
                species,
                name,
                effects_after,
            } => create::create_ship(
                ctx,
                design,
                empire.as_ref(),
                species.as_ref(),
                name.as_ref(),
                effects_after,
            ),
            Self::CreateField {
                field_type,
                x,
                y,
                size,
                name,
                effects_after,
            } => create::create_field(
                ctx,
                field_type,
                x.as_ref(),
                y.as_ref(),
                size.as_ref(),
                name.as_ref(),
                effects_after,
            ),
            Self::CreateSystem {
                star_type,
                x,
                y,
                name,
                effects_after,
            } => create::create_system(
                ctx,
                star_type.as_ref(),
                x.as_ref(),
                y.as_ref(),
                name.as_ref(),
                effects_after,
            ),

            Self::Destroy => modify::destroy(ctx),
            Self::AddSpecial { name, capacity } => modify::add_special(ctx, name, capacity.as_ref()),
            Self::RemoveSpecial { name } => modify::remove_special(ctx, name),
            Self::AddStarlanes { endpoints } => modify::edit_starlanes(ctx, endpoints, true),
            Self::RemoveStarlanes { endpoints } => modify::edit_starlanes(ctx, endpoints, false),

            Self::MoveTo { destination } => movement::move_to(ctx, destination),
            Self::MoveInOrbit { speed, focus } => movement::move_in_orbit(ctx, speed.as_ref(), focus),
            Self::MoveTowards { speed, destination } => {
                movement::move_towards(ctx, speed.as_ref(), destination)
            }
            Self::SetDestination { destination } => movement::set_destination(ctx, destination),
            Self::SetAggression { aggression } => modify::set_aggression(ctx, *aggression),

            Self::Victory { reason } => empire::victory(ctx, reason),
            Self::SetEmpireTechProgress {
                tech,
                progress,
                empire,
            } => empire::set_empire_tech_progress(ctx, tech, progress, empire),
            Self::GiveEmpireTech { tech, empire } => empire::give_empire_tech(ctx, tech, empire),

            Self::GenerateSitRepMessage {
                message,
                icon,
                parameters,
                recipient,
                condition,
                affiliation,
                label,
                stringtable_lookup,
            } => notify::generate_sitrep(
                ctx,
                &SitRep {
                    message,
                    icon,
                    parameters,
                    recipient: recipient.as_ref(),
                    condition: condition.as_ref(),
                    affiliation: *affiliation,
                    label,
                    stringtable_lookup: *stringtable_lookup,
                },
            ),
            Self::SetVisibility {
                visibility,
                affiliation,
                empire,
                condition,
            } => notify::set_visibility(ctx, visibility, *affiliation, empire.as_ref(), condition.as_ref()),

            Self::SetOverlayTexture { texture, size } => {
                modify::set_overlay_texture(ctx, texture, size.as_ref())
            }
            Self::SetTexture { texture } => modify::set_texture(ctx, texture),

            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let matched = condition
                    .as_ref()
                    .map_or(true, |condition| condition.matches(ctx, ctx.target));
                for effect in if matched { if_true } else { if_false } {
                    effect.execute(ctx);
                }
                Ok(())
            }
        }
    }

    /// Apply this effect to every id in `targets`.
    ///
    /// Meter effects take the fast paths in `batch` when no ledger is
    /// given. `cause` labels ledger records. Effects `filter` rejects are
    /// skipped.
    pub fn execute_batch(
        &self,
        ctx: &mut ScriptingContext<'_>,
        targets: &[ObjectId],
        cause: &EffectCause,
        mut ledger: Option<&mut AccountingLedger>,
        filter: ExecutionFilter,
    ) {
        if targets.is_empty() || !filter.admits(self) {
            return;
        }

        match self {
            Self::SetMeter {
                meter,
                value,
                accounting_label,
            } => batch::set_meter(
                ctx,
                *meter,
                value,
                accounting_label.as_deref(),
                targets,
                cause,
                ledger,
            ),
            Self::SetPartMeter {
                meter,
                part_name,
                value,
            } => batch::set_part_meter(ctx, *meter, part_name, value, targets, ledger.is_some()),
            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let (matched, unmatched) = match condition {
                    Some(condition) => condition.partition(ctx, targets),
                    None => (targets.to_vec(), Vec::new()),
                };
                tracing::trace!(matched = matched.len(), unmatched = unmatched.len(), "Conditional");
                for effect in if_true {
                    effect.execute_batch(ctx, &matched, cause, ledger.as_deref_mut(), filter);
                }
                for effect in if_false {
                    effect.execute_batch(ctx, &unmatched, cause, ledger.as_deref_mut(), filter);
                }
            }
            _ => {
                for &target in targets {
                    ctx.scoped(target, None, |ctx| self.execute(ctx));
                }
            }
        }
    }
}
