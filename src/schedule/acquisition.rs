//! Case acquisition: one narrative request per planned slot, with a local
//! fallback for every request that fails.

use futures::future::join_all;
use rand::Rng;
use tracing::{debug, warn};

use super::case_mix::CaseSlot;
use crate::case::{fallback_payload, Case, CasePayload, CaseSource, Phase};
use crate::error::NarrativeError;
use crate::narrative::{CaseRequest, NarrativeGenerator};

/// Rejects payloads that parsed but carry no usable content.
fn check_payload(payload: CasePayload) -> Result<CasePayload, NarrativeError> {
    if payload.mechanism.trim().is_empty() {
        return Err(NarrativeError::Malformed("empty mechanism".to_string()));
    }
    if payload.description.trim().is_empty() {
        return Err(NarrativeError::Malformed("empty description".to_string()));
    }
    Ok(payload)
}

/// Requests content for every slot and returns one case per slot, in slot order.
///
/// Requests run concurrently; results are resolved in slot order so fallback
/// draws from `rng` do not depend on completion order.
pub async fn acquire_cases<G, R>(
    slots: &[CaseSlot],
    generator: &G,
    environment: &str,
    region: &str,
    rng: &mut R,
) -> Vec<Case>
where
    G: NarrativeGenerator,
    R: Rng + ?Sized,
{
    let requests: Vec<CaseRequest> = slots
        .iter()
        .map(|slot| CaseRequest {
            descriptor: slot.descriptor.clone(),
            mechanism: slot.mechanism.clone(),
            environment: environment.to_string(),
            region: region.to_string(),
        })
        .collect();

    let results = join_all(requests.iter().map(|request| generator.generate_case(request))).await;

    slots
        .iter()
        .zip(results)
        .map(|(slot, result)| match result.and_then(check_payload) {
            Ok(payload) => {
                debug!(day = slot.day, descriptor = %slot.descriptor, "narrative case acquired");
                let case = Case::new(
                    slot.descriptor.clone(),
                    &slot.mechanism,
                    slot.is_trauma,
                    CaseSource::Narrative,
                    payload,
                );
                // evaluator routing follows the keyword classification
                if !case.payload.phases.is_empty()
                    && case.needs_surgery() != case.requires(Phase::Surgery)
                {
                    debug!(
                        day = slot.day,
                        descriptor = %slot.descriptor,
                        narrative_surgery = case.needs_surgery(),
                        "narrative phases disagree with keyword classification"
                    );
                }
                case
            }
            Err(e) => {
                warn!(day = slot.day, descriptor = %slot.descriptor, error = %e, "using fallback case");
                let payload = fallback_payload(&slot.descriptor, &slot.mechanism, slot.is_trauma, rng);
                Case::new(
                    slot.descriptor.clone(),
                    &slot.mechanism,
                    slot.is_trauma,
                    CaseSource::Fallback,
                    payload,
                )
            }
        })
        .collect()
}
