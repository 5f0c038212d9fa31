//! String transformation utilities for code generation
//!
//! These utilities belong in the generation domain as they are used
//! for deriving identifiers from names found in the interface description.

/// Converts a string to snake_case.
///
/// Handles camelCase, PascalCase, SCREAMING_SNAKE, kebab-case and
/// space-separated input.
///
/// # Examples
/// ```
/// use servicegen::generation::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("findTicketsByStatus"), "find_tickets_by_status");
/// assert_eq!(to_snake_case("NOT_FOUND_ERROR"), "not_found_error");
/// assert_eq!(to_snake_case("find-tickets"), "find_tickets");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            // Word boundary only on a lowercase to uppercase transition
            if i > 0 && prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase();
        } else if ch == '-' || ch == '_' || ch == ' ' || ch == '.' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to PascalCase by way of snake_case.
///
/// # Examples
/// ```
/// use servicegen::generation::utils::to_proper_case;
///
/// assert_eq!(to_proper_case("NOT_FOUND_ERROR"), "NotFoundError");
/// assert_eq!(to_proper_case("business-error"), "BusinessError");
/// ```
pub fn to_proper_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(upper_first)
        .collect()
}

/// Converts a string to camelCase, used for local variable names.
///
/// # Examples
/// ```
/// use servicegen::generation::utils::to_camel_case;
///
/// assert_eq!(to_camel_case("ticket_id"), "ticketId");
/// assert_eq!(to_camel_case("page-size"), "pageSize");
/// ```
pub fn to_camel_case(s: &str) -> String {
    lower_first(&to_proper_case(s))
}

/// Exported identifier for a property name.
///
/// Keeps the original casing of each segment so `userID` stays `UserID`.
/// A leading underscore is spelled out as `Underscore`.
///
/// # Examples
/// ```
/// use servicegen::generation::utils::to_public_identifier;
///
/// assert_eq!(to_public_identifier("userID"), "UserID");
/// assert_eq!(to_public_identifier("_links"), "UnderscoreLinks");
/// assert_eq!(to_public_identifier("content-type"), "ContentType");
/// ```
pub fn to_public_identifier(name: &str) -> String {
    let (prefix, rest) = match name.strip_prefix('_') {
        Some(rest) => ("Underscore", rest),
        None => ("", name),
    };

    let body: String = rest
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|segment| !segment.is_empty())
        .map(upper_first)
        .collect();

    let identifier = format!("{prefix}{body}");
    match identifier.chars().next() {
        Some(first) if first.is_ascii_digit() => format!("N{identifier}"),
        _ => identifier,
    }
}

/// Uppercases the first character
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Lowercases the first character
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Makes a local identifier safe for Go by suffixing reserved words and
/// names that would shadow the generated handler's own locals.
///
/// # Examples
/// ```
/// use servicegen::generation::utils::sanitize_go_identifier;
///
/// assert_eq!(sanitize_go_identifier("type"), "typeParam");
/// assert_eq!(sanitize_go_identifier("status"), "status");
/// ```
pub fn sanitize_go_identifier(s: &str) -> String {
    match s {
        "break" | "case" | "chan" | "const" | "continue" | "default" | "defer" | "else"
        | "fallthrough" | "for" | "func" | "go" | "goto" | "if" | "import" | "interface"
        | "map" | "package" | "range" | "return" | "select" | "struct" | "switch" | "type"
        | "var" | "w" | "r" | "h" | "req" | "resp" | "page" | "size" | "sort" | "content"
        | "total" | "applicationErr" | "handler" | "item" | "dto" | "json" | "http"
        | "ngErrors" | "svc" => format!("{s}Param"),
        _ => s.to_string(),
    }
}
