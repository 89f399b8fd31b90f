use super::id::EntityId;
use super::status::Status;
use crate::dates;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A tracked job application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Opportunity {
    pub id: EntityId,
    pub company: String,
    pub position: String,
    pub status: Status,
    /// Anchor date for derived reminders (the applied or added date).
    #[serde(alias = "appliedDate", alias = "dateAdded")]
    pub reference_date: String,
    pub job_description: String,
    /// Resume text tailored for this application.
    #[serde(alias = "tailoredResume")]
    pub resume: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tags: BTreeSet<String>,
}

impl Opportunity {
    /// Minimal opportunity with the given identity and role.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, company: &str, position: &str) -> Self {
        Self {
            id: id.into(),
            company: company.to_string(),
            position: position.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_reference_date(mut self, date: &str) -> Self {
        self.reference_date = date.to_string();
        self
    }

    /// The reference date, or `fallback` when it does not parse.
    #[must_use]
    pub fn reference_date_or(&self, fallback: NaiveDate) -> NaiveDate {
        dates::date_or(&self.reference_date, fallback)
    }

    /// Merge a patch into this record. The `id` field of the patch is
    /// not applied here; renames go through the reducer so references
    /// can be re-keyed.
    ///
    /// Returns `true` when a field feeding derived reminders changed.
    pub fn apply(&mut self, patch: &OpportunityPatch) -> bool {
        let before = self.derivation_key();

        if let Some(company) = &patch.company {
            self.company.clone_from(company);
        }
        if let Some(position) = &patch.position {
            self.position.clone_from(position);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date) = &patch.reference_date {
            self.reference_date.clone_from(date);
        }
        if let Some(description) = &patch.job_description {
            self.job_description.clone_from(description);
        }
        if let Some(resume) = &patch.resume {
            self.resume.clone_from(resume);
        }
        if let Some(tags) = &patch.tags {
            self.tags.clone_from(tags);
        }

        set_optional(&mut self.contact_name, patch.contact_name.as_deref());
        set_optional(&mut self.contact_email, patch.contact_email.as_deref());
        set_optional(&mut self.contact_phone, patch.contact_phone.as_deref());
        set_optional(&mut self.notes, patch.notes.as_deref());
        set_optional(&mut self.location, patch.location.as_deref());
        set_optional(&mut self.salary, patch.salary.as_deref());
        set_optional(&mut self.source, patch.source.as_deref());

        before != self.derivation_key()
    }

    fn derivation_key(&self) -> (Status, String, String, String, Option<String>) {
        (
            self.status,
            self.reference_date.clone(),
            self.company.clone(),
            self.position.clone(),
            self.location.clone(),
        )
    }
}

/// An empty string clears an optional field.
fn set_optional(slot: &mut Option<String>, value: Option<&str>) {
    match value {
        Some("") => *slot = None,
        Some(v) => *slot = Some(v.to_string()),
        None => {}
    }
}

/// Partial update for an [`Opportunity`]. Unset fields are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct OpportunityPatch {
    /// Authoritative id issued by the remote store, folded back in place
    /// of the local one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "appliedDate",
        alias = "dateAdded"
    )]
    pub reference_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "tailoredResume")]
    pub resume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

impl OpportunityPatch {
    #[must_use]
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
