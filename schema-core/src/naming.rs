#![forbid(unsafe_code)]

/// Words the schema grammar reserves; none may be used as an import alias.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "datatype", "extends", "false", "import", "in", "nil", "part", "primary",
    "required", "schema", "self", "true", "type", "Boolean", "Date", "Enum", "Float", "Integer",
    "List", "Pattern", "String", "Timestamp", "UUID", "Vector",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// `[A-Za-z][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Lower-snake-case form used as the merge and scope identity of relations
/// and properties: `ITEMS` -> `items`, `OrderedBy` -> `ordered_by`,
/// `HTTPServer` -> `http_server`.
pub fn field_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names() {
        assert_eq!(field_name("ITEMS"), "items");
        assert_eq!(field_name("OrderedBy"), "ordered_by");
        assert_eq!(field_name("HTTPServer"), "http_server");
        assert_eq!(field_name("HAS_OWNER"), "has_owner");
        assert_eq!(field_name("line-items"), "line_items");
        assert_eq!(field_name("name"), "name");
        assert_eq!(field_name("firstName"), "first_name");
        assert_eq!(field_name("Address2Line"), "address2_line");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("shared"));
        assert!(is_identifier("v2_common"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("_hidden"));
        assert!(!is_identifier("with-dash"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn keywords() {
        assert!(is_keyword("type"));
        assert!(is_keyword("self"));
        assert!(!is_keyword("shared"));
    }
}
