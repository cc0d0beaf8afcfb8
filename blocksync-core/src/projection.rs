//! Projection of source events into privacy-scrubbed surrogates.

use crate::event::{CalendarRef, ProjectedEvent, SourceEvent};
use crate::identity::{HmacIdDeriver, IdDeriver, IdentityInput};
use crate::policy::Policy;

/// Fixed description of every surrogate. Never derived from source content.
pub const SURROGATE_DESCRIPTION: &str = "this entry was created by the blocksync sync service :]";

/// Projects source events for one destination calendar under one policy.
pub struct Projector<'a, D: IdDeriver = HmacIdDeriver> {
    policy: &'a Policy,
    container: &'a CalendarRef,
    deriver: D,
}

impl<'a> Projector<'a, HmacIdDeriver> {
    pub fn new(policy: &'a Policy, container: &'a CalendarRef) -> Self {
        let deriver = HmacIdDeriver::new(&policy.id_hash_seed);
        Projector::with_deriver(policy, container, deriver)
    }
}

impl<'a, D: IdDeriver> Projector<'a, D> {
    pub fn with_deriver(policy: &'a Policy, container: &'a CalendarRef, deriver: D) -> Self {
        Projector {
            policy,
            container,
            deriver,
        }
    }

    pub fn policy(&self) -> &Policy {
        self.policy
    }

    /// Build the surrogate for `item`.
    pub fn project(&self, item: &SourceEvent) -> ProjectedEvent {
        let subject = item.subject();
        let public_subject = self.policy.public_subject(subject);
        let passthrough = self.policy.passthrough_component();

        let id = self.deriver.derive(&IdentityInput {
            container: &self.container.url,
            start: &item.start,
            end: &item.end,
            subject: subject.unwrap_or_default(),
            public_subject: &public_subject,
            extra: &[passthrough.as_str()],
        });

        ProjectedEvent {
            id,
            summary: public_subject,
            description: SURROGATE_DESCRIPTION.to_string(),
            start: item.start,
            end: item.end,
        }
    }
}
