#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameComponents {
    pub base: String,
    pub extension: String,
}

impl NameComponents {
    pub fn join(&self) -> String {
        format!("{}{}", self.base, self.extension)
    }
}

/// Splits `name` at its final `.`. Leading dots belong to the base, so
/// `.bashrc` has no extension.
pub fn split_name(name: &str) -> NameComponents {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name[leading_dots..].rfind('.') {
        Some(pos) => {
            let split_at = leading_dots + pos;
            NameComponents {
                base: name[..split_at].to_string(),
                extension: name[split_at..].to_string(),
            }
        }
        None => NameComponents {
            base: name.to_string(),
            extension: String::new(),
        },
    }
}

/// Rebuilds a name after running `f` over the base only.
pub fn map_base(name: &str, f: impl FnOnce(&str) -> String) -> String {
    let parts = split_name(name);
    format!("{}{}", f(&parts.base), parts.extension)
}
