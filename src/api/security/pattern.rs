//! Ant-style URL patterns for permission rules: literal segments, `*` for
//! exactly one segment, a trailing `/**` for any suffix (including none).

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    AnyOne,
    AnyTail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct UrlPattern {
    segments: Vec<Segment>,
}

impl UrlPattern {
    pub(super) fn parse(pattern: &str) -> Self {
        let segments = pattern
            .trim_start_matches('/')
            .split('/')
            .map(|segment| match segment {
                "**" => Segment::AnyTail,
                "*" => Segment::AnyOne,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub(super) fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        Self::matches_from(&self.segments, &parts)
    }

    fn matches_from(segments: &[Segment], parts: &[&str]) -> bool {
        match segments.split_first() {
            None => parts.is_empty(),
            // `**` is only honored in the trailing position.
            Some((Segment::AnyTail, _)) => true,
            Some((Segment::AnyOne, rest)) => match parts.split_first() {
                Some((part, tail)) if !part.is_empty() => Self::matches_from(rest, tail),
                _ => false,
            },
            Some((Segment::Literal(literal), rest)) => match parts.split_first() {
                Some((part, tail)) if part == literal => Self::matches_from(rest, tail),
                _ => false,
            },
        }
    }
}
