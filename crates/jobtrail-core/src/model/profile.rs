use serde::{Deserialize, Serialize};

/// Auxiliary profile data kept alongside the three core collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    pub skills: Vec<String>,
    pub target_roles: Vec<String>,
}

impl UserProfile {
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(skills) = &patch.skills {
            self.skills.clone_from(skills);
        }
        if let Some(roles) = &patch.target_roles {
            self.target_roles.clone_from(roles);
        }
        for (slot, value) in [
            (&mut self.phone, &patch.phone),
            (&mut self.location, &patch.location),
            (&mut self.headline, &patch.headline),
            (&mut self.linkedin, &patch.linkedin),
            (&mut self.github, &patch.github),
            (&mut self.portfolio, &patch.portfolio),
        ] {
            match value.as_deref() {
                Some("") => *slot = None,
                Some(v) => *slot = Some(v.to_string()),
                None => {}
            }
        }
    }
}

/// Partial profile update; unset fields are left alone and an empty
/// string clears an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_roles: Option<Vec<String>>,
}
