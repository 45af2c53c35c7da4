/// A shader reference as written in a window rule or a dispatch command.
///
/// `"tint"` names a registered shader directly. `"tint tintStrength=0.4"`
/// names a base shader followed by uniform overrides; everything after the
/// first space is argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier<'a> {
    Bare(&'a str),
    Parameterized { base: &'a str, arguments: &'a str },
}

impl<'a> Specifier<'a> {
    pub fn parse(input: &'a str) -> Self {
        match input.split_once(' ') {
            Some((base, arguments)) => Self::Parameterized {
                base: base.trim(),
                arguments,
            },
            None => Self::Bare(input),
        }
    }

    pub fn base(&self) -> &'a str {
        match self {
            Self::Bare(id) => *id,
            Self::Parameterized { base, .. } => *base,
        }
    }
}
