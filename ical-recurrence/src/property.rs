//! Decoding of `NAME;PARAM=V:VALUE;PARAM=V` property lines.

/// Parameters attached to one side of a property line, in source order.
///
/// Duplicate names are kept as-is; lookups return the last occurrence, the
/// way a repeated segment overwrites an earlier one. Names are matched
/// case-sensitively, as recurrence text conventionally keeps them upper-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Parameters<'a>(Vec<(&'a str, Option<&'a str>)>);

impl<'a> Parameters<'a> {
    /// Returns the value of the last parameter with this name, if that
    /// occurrence carries a value.
    pub(crate) fn get(&self, name: &str) -> Option<&'a str> {
        self.0
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| *value)
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One property line split into its name and value terms.
///
/// A term is the text on one side of the first `:`; each term is a head
/// followed by `;`-separated parameters. Decoded properties borrow from the
/// scanned line and are dropped once their fields are folded into the rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedProperty<'a> {
    pub(crate) name: &'a str,
    pub(crate) name_params: Parameters<'a>,
    pub(crate) value: &'a str,
    pub(crate) value_params: Parameters<'a>,
}

impl<'a> ParsedProperty<'a> {
    /// Splits a line at the first `:` and decodes both terms. A line with no
    /// `:` decodes as a name term with an empty value term.
    pub(crate) fn parse(line: &'a str) -> Self {
        let (name_side, value_side) = line.split_once(':').unwrap_or((line, ""));
        let (name, name_params) = parse_term(name_side);
        let (value, value_params) = parse_term(value_side);
        ParsedProperty { name, name_params, value, value_params }
    }
}

/// Decodes one term into its head and parameters.
///
/// Segments are separated by `;`. The first segment is the head only when it
/// contains no `=`; a leading `PARAM=V` segment leaves the head empty rather
/// than swallowing the parameter. Within a segment, text after the first `=`
/// is the parameter value; a segment with no `=` is a parameter without a
/// value. Empty segments, as left by a trailing `;`, are dropped.
fn parse_term(term: &str) -> (&str, Parameters<'_>) {
    let mut segments = term.split(';');
    let first = segments.next().unwrap_or_default();
    let (head, leading_param) =
        if first.contains('=') { ("", Some(first)) } else { (first, None) };
    let mut params = Vec::new();
    for segment in leading_param.into_iter().chain(segments) {
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) => params.push((key, Some(value))),
            None => params.push((segment, None)),
        }
    }
    (head, Parameters(params))
}
