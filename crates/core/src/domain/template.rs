use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub String);

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_modified: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateList {
    #[serde(default)]
    pub results: Vec<TemplateSummary>,
}

/// A fillable field placed on a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateField {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub field_id: Option<String>,
    #[serde(default)]
    pub merge_field: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A signing role that recipients are assigned to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRole {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub signing_order: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDetails {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<TemplateField>,
    #[serde(default)]
    pub roles: Vec<TemplateRole>,
}

impl TemplateDetails {
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|role| role.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{TemplateDetails, TemplateList};

    #[test]
    fn template_details_decode_fields_and_roles() {
        let details: TemplateDetails = serde_json::from_value(serde_json::json!({
            "id": "tmpl-123",
            "name": "Mutual NDA",
            "fields": [
                {"uuid": "f-1", "name": "Company", "merge_field": "company_name", "type": "text"}
            ],
            "roles": [
                {"id": "r-1", "name": "signer", "signing_order": 1},
                {"name": "witness"}
            ],
            "tokens": [{"name": "date", "value": ""}]
        }))
        .expect("details should decode");

        assert_eq!(details.fields.len(), 1);
        assert_eq!(details.fields[0].kind.as_deref(), Some("text"));
        assert_eq!(details.role_names(), vec!["signer", "witness"]);
    }

    #[test]
    fn template_list_tolerates_missing_results() {
        let list: TemplateList = serde_json::from_str("{}").expect("empty object should decode");
        assert!(list.results.is_empty());
    }
}
