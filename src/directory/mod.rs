//! Mapping between human attribute names (`DOCTOR`, `CARDIOLOGY`) and the
//! integer ids the scheme works with.
//!
//! Names are normalized by trimming and upper-casing, so `" doctor"` and
//! `"DOCTOR"` denote the same attribute. Ids are bounded by the universe size.
use std::collections::BTreeMap;
use crate::error::AbeError;
use crate::utils::policy::PolicyNode;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AttributeDirectory {
    universe_size: usize,
    by_name: BTreeMap<String, usize>,
    by_id: BTreeMap<usize, String>,
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

fn unknown(name: &str) -> AbeError {
    AbeError::PolicySyntaxError(format!("unknown attribute {}", name))
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

impl AttributeDirectory {
    pub fn new(universe_size: usize) -> AttributeDirectory {
        AttributeDirectory {
            universe_size,
            by_name: BTreeMap::new(),
            by_id: BTreeMap::new(),
        }
    }

    /// Assigns ids `0, 1, ...` in the order of `names`.
    pub fn from_names<S: AsRef<str>>(universe_size: usize, names: &[S]) -> Result<AttributeDirectory, AbeError> {
        let mut directory = AttributeDirectory::new(universe_size);
        for name in names {
            directory.register(name.as_ref())?;
        }
        Ok(directory)
    }

    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Binds `name` to `id`. Rebinding either side to something else fails.
    pub fn insert(&mut self, name: &str, id: usize) -> Result<(), AbeError> {
        let name = normalize(name);
        if name.is_empty() || !name.chars().all(is_name_char) || name.chars().all(|c| c.is_ascii_digit()) {
            return Err(AbeError::Config(format!("invalid attribute name '{}'", name)));
        }
        if matches!(name.as_str(), "AND" | "OR" | "OF") {
            return Err(AbeError::Config(format!("attribute name '{}' is reserved", name)));
        }
        if id >= self.universe_size {
            return Err(AbeError::InvalidAttribute { attribute: id, universe_size: self.universe_size });
        }
        match (self.by_name.get(&name), self.by_id.get(&id)) {
            (None, None) => {
                self.by_id.insert(id, name.clone());
                self.by_name.insert(name, id);
                Ok(())
            }
            (Some(existing), _) if *existing == id => Ok(()),
            _ => Err(AbeError::Config(format!("attribute '{}' or id {} is already bound", name, id))),
        }
    }

    /// Binds `name` to the lowest free id, or returns its existing id.
    pub fn register(&mut self, name: &str) -> Result<usize, AbeError> {
        if let Some(id) = self.by_name.get(&normalize(name)) {
            return Ok(*id);
        }
        let id = (0..self.universe_size)
            .find(|id| !self.by_id.contains_key(id))
            .ok_or(AbeError::InvalidAttribute {
                attribute: self.universe_size,
                universe_size: self.universe_size,
            })?;
        self.insert(name, id)?;
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Result<usize, AbeError> {
        self.by_name.get(&normalize(name)).copied().ok_or_else(|| unknown(name))
    }

    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.by_id.get(&id).map(|s| s.as_str())
    }

    /// Names for display; unknown ids are shown as numbers.
    pub fn names_of(&self, ids: &[usize]) -> Vec<String> {
        ids.iter()
            .map(|id| self.name_of(*id).map(|s| s.to_string()).unwrap_or_else(|| id.to_string()))
            .collect()
    }

    /// Resolves a comma separated list such as `"doctor, Cardiology"`.
    /// Empty entries are skipped; an empty list is `EmptyAttributeSet`.
    pub fn parse_attribute_list(&self, list: &str) -> Result<Vec<usize>, AbeError> {
        let mut ids = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let id = match entry.parse::<usize>() {
                Ok(id) if id < self.universe_size => id,
                Ok(id) => return Err(AbeError::InvalidAttribute { attribute: id, universe_size: self.universe_size }),
                Err(_) => self.id_of(entry)?,
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(AbeError::EmptyAttributeSet);
        }
        Ok(ids)
    }

    /// Rewrites attribute names in `policy` to ids; numbers, connectives and
    /// threshold syntax pass through unchanged.
    pub fn resolve_policy(&self, policy: &str) -> Result<String, AbeError> {
        let mut result = String::with_capacity(policy.len());
        let mut token = String::new();
        let mut previous: Option<char> = None;
        for c in policy.chars().chain(std::iter::once(' ')) {
            if is_name_char(c) {
                token.push(c);
                continue;
            }
            if !token.is_empty() {
                result.push_str(&self.resolve_token(&token, previous, c)?);
                token.clear();
            }
            previous = Some(c);
            result.push(c);
        }
        result.pop();
        Ok(result)
    }

    fn resolve_token(&self, token: &str, before: Option<char>, after: char) -> Result<String, AbeError> {
        let upper = token.to_uppercase();
        let keyword = upper == "AND" || upper == "OR" || (upper == "OF" && before == Some('-') && after == '-');
        if keyword || token.chars().all(|c| c.is_ascii_digit()) {
            Ok(token.to_string())
        } else {
            Ok(self.id_of(token)?.to_string())
        }
    }

    /// [`AttributeDirectory::resolve_policy`] followed by [`PolicyNode::parse`].
    pub fn parse_policy(&self, policy: &str) -> Result<PolicyNode, AbeError> {
        PolicyNode::parse(&self.resolve_policy(policy)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hospital() -> AttributeDirectory {
        AttributeDirectory::from_names(4, &["doctor", "nurse", "ADMIN", "cardiology"]).unwrap()
    }

    #[test]
    fn test_register() {
        let mut directory = hospital();
        assert_eq!(directory.len(), 4);
        assert_eq!(directory.id_of(" Doctor ").unwrap(), 0);
        assert_eq!(directory.id_of("CARDIOLOGY").unwrap(), 3);
        assert_eq!(directory.register("nurse").unwrap(), 1);
        assert_eq!(
            directory.register("pharmacist"),
            Err(AbeError::InvalidAttribute { attribute: 4, universe_size: 4 })
        );
        assert!(directory.insert("surgeon", 0).is_err());
        assert!(directory.insert("and", 0).is_err());
        assert!(directory.insert("42", 0).is_err());
    }

    #[test]
    fn test_parse_attribute_list() {
        let directory = hospital();
        assert_eq!(directory.parse_attribute_list("doctor, Cardiology").unwrap(), vec![0, 3]);
        assert_eq!(directory.parse_attribute_list(" nurse,, nurse ,2").unwrap(), vec![1, 2]);
        assert_eq!(directory.parse_attribute_list(" , "), Err(AbeError::EmptyAttributeSet));
        assert!(matches!(directory.parse_attribute_list("doctor, janitor"), Err(AbeError::PolicySyntaxError(_))));
        assert_eq!(
            directory.parse_attribute_list("7"),
            Err(AbeError::InvalidAttribute { attribute: 7, universe_size: 4 })
        );
    }

    #[test]
    fn test_resolve_policy() {
        let directory = hospital();
        assert_eq!(
            directory.resolve_policy("(doctor and CARDIOLOGY) OR admin").unwrap(),
            "(0 and 3) OR 2"
        );
        assert_eq!(
            directory.resolve_policy("2-of-(doctor, nurse, 3)").unwrap(),
            "2-of-(0, 1, 3)"
        );
        assert_eq!(
            directory.parse_policy("(DOCTOR AND CARDIOLOGY) OR ADMIN").unwrap(),
            PolicyNode::parse("(0 AND 3) OR 2").unwrap()
        );
        assert!(matches!(directory.resolve_policy("doctor OR janitor"), Err(AbeError::PolicySyntaxError(_))));
    }

    #[test]
    fn test_names_of() {
        let directory = hospital();
        assert_eq!(directory.names_of(&[3, 0]), vec!["CARDIOLOGY".to_string(), "DOCTOR".to_string()]);
        assert_eq!(directory.name_of(1), Some("NURSE"));
        let sparse = AttributeDirectory::new(10);
        assert_eq!(sparse.names_of(&[7]), vec!["7".to_string()]);
    }
}
