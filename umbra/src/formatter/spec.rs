use crate::formatter::grammar::ParseError;

/// Alignment requested by a format spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Align {
  /// No explicit alignment; behaves like [`Align::Left`].
  #[default]
  Default,
  Left,
  Center,
  Right,
}

/// Output type requested by a format spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
  Decimal,
  Str,
  Float,
}

/// A parsed printf-like format spec: `[[fill]align][width][.precision][type]`
/// with align one of `<`, `^`, `>` and type one of `d`, `s`, `f`.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Spec {
  pub fill: Option<char>,
  pub align: Align,
  pub width: Option<usize>,
  pub precision: Option<usize>,
  pub kind: Option<Kind>,
}

fn align_of(c: char) -> Option<Align> {
  match c {
    '<' => Some(Align::Left),
    '^' => Some(Align::Center),
    '>' => Some(Align::Right),
    _ => None,
  }
}

impl Spec {
  /// Parses `raw`, reporting errors at byte offset `at` of the pattern.
  pub fn parse(raw: &str, at: usize) -> Result<Self, ParseError> {
    let chars: Vec<char> = raw.chars().collect();
    let mut spec = Spec::default();
    let mut i = 0;

    if chars.len() >= 2 {
      if let Some(align) = align_of(chars[1]) {
        spec.fill = Some(chars[0]);
        spec.align = align;
        i = 2;
      }
    }
    if i == 0 && !chars.is_empty() {
      if let Some(align) = align_of(chars[0]) {
        spec.align = align;
        i = 1;
      }
    }

    let mut width = 0usize;
    let mut saw_width = false;
    while i < chars.len() && chars[i].is_ascii_digit() {
      saw_width = true;
      width = width * 10 + (chars[i] as usize - '0' as usize);
      i += 1;
    }
    if saw_width {
      spec.width = Some(width);
    }

    if i < chars.len() && chars[i] == '.' {
      i += 1;
      let mut precision = 0usize;
      let mut saw_precision = false;
      while i < chars.len() && chars[i].is_ascii_digit() {
        saw_precision = true;
        precision = precision * 10 + (chars[i] as usize - '0' as usize);
        i += 1;
      }
      if !saw_precision {
        return Err(ParseError::new("missing digits after '.' in format spec", at));
      }
      spec.precision = Some(precision);
    }

    if i < chars.len() {
      spec.kind = match chars[i] {
        'd' => Some(Kind::Decimal),
        's' => Some(Kind::Str),
        'f' => Some(Kind::Float),
        other => {
          return Err(ParseError::new(
            format!("unknown format type '{}'", other),
            at,
          ));
        },
      };
      i += 1;
    }

    if i != chars.len() {
      return Err(ParseError::new("trailing characters in format spec", at));
    }

    Ok(spec)
  }

  /// Appends `text` to `out`, honoring width, fill, alignment and (for
  /// string output) precision-based truncation.
  pub fn pad(&self, text: &str, out: &mut String) {
    let truncated: &str = match self.precision {
      Some(limit) if self.kind != Some(Kind::Float) => match text.char_indices().nth(limit) {
        Some((cut, _)) => &text[..cut],
        None => text,
      },
      _ => text,
    };

    let width = self.width.unwrap_or(0);
    let length = truncated.chars().count();
    if length >= width {
      out.push_str(truncated);
      return;
    }

    let fill = self.fill.unwrap_or(' ');
    let missing = width - length;
    match self.align {
      Align::Default | Align::Left => {
        out.push_str(truncated);
        out.extend(std::iter::repeat(fill).take(missing));
      },
      Align::Right => {
        out.extend(std::iter::repeat(fill).take(missing));
        out.push_str(truncated);
      },
      Align::Center => {
        let left = missing / 2;
        out.extend(std::iter::repeat(fill).take(left));
        out.push_str(truncated);
        out.extend(std::iter::repeat(fill).take(missing - left));
      },
    }
  }
}
