//! `{{name}}` placeholder substitution for command comments.

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replaces every `{{name}}` in `template` whose name appears in `fields`.
///
/// The template is scanned once from left to right and substituted values are
/// copied to the output as-is, so a value that itself looks like a placeholder
/// is never expanded again. Placeholders without a field stay verbatim.
pub fn render(template: &str, fields: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        rendered.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let value = after_open.find(CLOSE).and_then(|end| {
            let name = &after_open[..end];
            lookup(fields, name).map(|value| (value, end))
        });

        match value {
            Some((value, end)) => {
                rendered.push_str(value);
                rest = &after_open[end + CLOSE.len()..];
            }
            None => {
                // step past a single brace so `{{{name}}}` still finds `{{name}}`
                rendered.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

fn lookup<'a>(fields: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, value)| *value)
}
