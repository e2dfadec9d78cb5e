//! Parses a MiniLight model file into a render-ready [`Scene`] plus the
//! iteration count, image dimensions, and camera it specifies. A
//! line-oriented grammar (spec §6): header, iteration count, image size,
//! camera line, sky/ground line, then zero or more triangle lines.

use crate::camera::Camera;
use crate::constants::{IMAGE_DIM_MAX, MAX_TRIANGLES};
use crate::error::MiniLightError;
use crate::scene::Scene;
use crate::triangle::Triangle;
use crate::vec3::Vec3;

/// Everything read out of a model file, ready to hand to the render loop.
pub struct Model {
    pub iterations: u32,
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
    pub scene: Scene,
}

/// Reads and parses `text` as a MiniLight model file.
pub fn parse(text: &str) -> Result<Model, MiniLightError> {
    let mut lines = NonBlankLines::new(text);

    let (header_no, header) = lines
        .next()
        .ok_or_else(|| invalid(1, "empty file, expected a #MiniLight header"))?;
    if !header.trim_start().starts_with("#MiniLight") {
        return Err(invalid(header_no, "first line must begin with #MiniLight"));
    }

    let (line_no, line) = require_line(&mut lines)?;
    let iterations = parse_int(line_no, line.trim(), "iterations")? as u32;

    let (line_no, line) = require_line(&mut lines)?;
    let mut fields = tokenize(line).into_iter();
    let width = next_int(&mut fields, line_no, "image width")?.clamp(1, IMAGE_DIM_MAX as i64) as u32;
    let height =
        next_int(&mut fields, line_no, "image height")?.clamp(1, IMAGE_DIM_MAX as i64) as u32;

    let (line_no, line) = require_line(&mut lines)?;
    let mut fields = tokenize(line).into_iter();
    let view_position = next_vec3(&mut fields, line_no, "camera position")?;
    let view_direction = next_vec3(&mut fields, line_no, "camera direction")?;
    let view_angle = next_float(&mut fields, line_no, "camera view angle")?;
    let camera = Camera::new(view_position, view_direction, view_angle);

    let (line_no, line) = require_line(&mut lines)?;
    let mut fields = tokenize(line).into_iter();
    let sky = next_vec3(&mut fields, line_no, "sky emission")?;
    let ground_reflection_factor = next_vec3(&mut fields, line_no, "ground reflection factor")?;

    let mut triangles = Vec::new();
    for (line_no, line) in lines {
        if triangles.len() >= MAX_TRIANGLES {
            tracing::warn!(
                line = line_no,
                "model file exceeds the {} triangle limit; remaining lines are ignored",
                MAX_TRIANGLES
            );
            break;
        }
        let mut fields = tokenize(line).into_iter();
        let v0 = next_vec3(&mut fields, line_no, "triangle vertex 0")?;
        let v1 = next_vec3(&mut fields, line_no, "triangle vertex 1")?;
        let v2 = next_vec3(&mut fields, line_no, "triangle vertex 2")?;
        let reflectivity = next_vec3(&mut fields, line_no, "triangle reflectivity")?;
        let emissivity = next_vec3(&mut fields, line_no, "triangle emissivity")?;
        triangles.push(Triangle::new(v0, v1, v2, reflectivity, emissivity));
    }

    let scene = Scene::new(view_position, triangles, sky, ground_reflection_factor);

    Ok(Model {
        iterations,
        width,
        height,
        camera,
        scene,
    })
}

fn invalid(line: usize, detail: impl Into<String>) -> MiniLightError {
    MiniLightError::InvalidFormat {
        line,
        detail: detail.into(),
    }
}

fn require_line<'a>(
    lines: &mut NonBlankLines<'a>,
) -> Result<(usize, &'a str), MiniLightError> {
    let at_eof = lines.line_no;
    lines
        .next()
        .ok_or_else(|| invalid(at_eof, "unexpected end of file"))
}

/// Splits a line into whitespace-separated fields, treating `(` and `)`
/// as field separators rather than tokens of their own — `(1 2 3)` and
/// `1 2 3` tokenize identically.
fn tokenize(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .filter(|s| !s.is_empty())
        .collect()
}

fn next_float<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<f64, MiniLightError> {
    let field = fields
        .next()
        .ok_or_else(|| invalid(line, format!("missing field for {what}")))?;
    field
        .parse::<f64>()
        .map_err(|_| invalid(line, format!("{what}: cannot parse \"{field}\" as a number")))
}

fn next_int<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<i64, MiniLightError> {
    let field = fields
        .next()
        .ok_or_else(|| invalid(line, format!("missing field for {what}")))?;
    field
        .parse::<i64>()
        .map_err(|_| invalid(line, format!("{what}: cannot parse \"{field}\" as an integer")))
}

fn next_vec3<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &str,
) -> Result<Vec3, MiniLightError> {
    let x = next_float(fields, line, &format!("{what}.x"))?;
    let y = next_float(fields, line, &format!("{what}.y"))?;
    let z = next_float(fields, line, &format!("{what}.z"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_int(line: usize, field: &str, what: &str) -> Result<i64, MiniLightError> {
    field
        .parse::<i64>()
        .map_err(|_| invalid(line, format!("{what}: cannot parse \"{field}\" as an integer")))
}

/// Iterates `(1-based line number, trimmed content)` pairs, skipping blank
/// lines always and `#`-prefixed comment lines once the header has been
/// consumed. The header itself (the first non-blank line) must start with
/// `#MiniLight`, so it is deliberately exempt from comment-skipping — only
/// lines *after* it are treated as tolerated comments (a strict superset
/// of the documented grammar: comments are tolerated wherever blank lines
/// are, but never in place of the header).
struct NonBlankLines<'a> {
    remaining: std::str::Lines<'a>,
    line_no: usize,
    header_seen: bool,
}

impl<'a> NonBlankLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            remaining: text.lines(),
            line_no: 0,
            header_seen: false,
        }
    }
}

impl<'a> Iterator for NonBlankLines<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        for raw in &mut self.remaining {
            self.line_no += 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self.header_seen && trimmed.starts_with('#') {
                continue;
            }
            self.header_seen = true;
            return Some((self.line_no, raw));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> String {
        "\
#MiniLight

10
10 10

(0 0.75 -3.5) (0 0 1) 45

(0 0 0) (1 1 1)

(0 0 0) (1 0 0) (1 1 0) (0.5 0.5 0.5) (0 0 0)
"
        .to_string()
    }

    #[test]
    fn parses_a_complete_model() {
        let model = parse(&sample_model()).unwrap();
        assert_eq!(model.iterations, 10);
        assert_eq!(model.width, 10);
        assert_eq!(model.height, 10);
        assert_eq!(model.scene.triangles().len(), 1);
    }

    #[test]
    fn header_line_itself_is_not_treated_as_a_skipped_comment() {
        // Regression test: the header is the first non-blank line and
        // starts with '#', so the comment-skipping rule must not apply to
        // it, or every valid model file would be rejected.
        let text = "#MiniLight\n10\n10 10\n(0 0 0) (0 0 1) 45\n(0 0 0) (1 1 1)\n";
        let model = parse(text).unwrap();
        assert_eq!(model.iterations, 10);
    }

    #[test]
    fn missing_header_is_invalid_format() {
        let text = "10\n10 10\n(0 0 0) (0 0 1) 45\n(0 0 0) (1 1 1)\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, MiniLightError::InvalidFormat { line: 1, .. }));
    }

    #[test]
    fn non_numeric_field_is_invalid_format() {
        let text = "#MiniLight\nten\n10 10\n(0 0 0) (0 0 1) 45\n(0 0 0) (1 1 1)\n";
        let err = parse(text).unwrap_err();
        assert!(matches!(err, MiniLightError::InvalidFormat { .. }));
    }

    #[test]
    fn image_dimensions_are_clamped() {
        let text = "#MiniLight\n10\n0 999999\n(0 0 0) (0 0 1) 45\n(0 0 0) (1 1 1)\n";
        let model = parse(text).unwrap();
        assert_eq!(model.width, 1);
        assert_eq!(model.height, IMAGE_DIM_MAX);
    }

    #[test]
    fn parenthesized_and_bare_triples_are_equivalent() {
        let text_parens = sample_model();
        let text_bare = text_parens.replace(['(', ')'], "");
        let a = parse(&text_parens).unwrap();
        let b = parse(&text_bare).unwrap();
        assert_eq!(a.scene.triangles().len(), b.scene.triangles().len());
    }

    #[test]
    fn comment_lines_after_header_are_skipped() {
        let text = "\
#MiniLight
# a friendly comment
10
10 10
(0 0 0) (0 0 1) 45
(0 0 0) (1 1 1)
";
        let model = parse(text).unwrap();
        assert_eq!(model.iterations, 10);
    }
}
