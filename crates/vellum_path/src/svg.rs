//! SVG path data
//!
//! Parsing covers the move, line, cubic and quadratic commands in absolute
//! and relative form plus `Z`. Quadratic curves are elevated to cubics, so
//! every parsed contour is made of [`Segment`]s with relative handles.
//! Elliptical arcs are not supported.

use nom::{
    bytes::complete::tag,
    character::complete::{char, multispace1, one_of},
    combinator::{all_consuming, opt, value},
    error::{context, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::many0,
    number::complete::double,
    sequence::{preceded, terminated, tuple},
    Finish, IResult,
};
use vellum_geom::numerical::GEOMETRIC_EPSILON;
use vellum_geom::Point;

use crate::error::{PathError, Result};
use crate::path::Path;
use crate::segment::Segment;

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// A command letter with its arguments, before interpretation
struct Command<'a> {
    at: &'a str,
    letter: char,
    args: Vec<f64>,
}

fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), many0(value((), multispace1)))(input)
}

/// Whitespace with at most one comma in it
fn separator<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), tuple((ws, opt(char(',')), ws)))(input)
}

fn number(input: &str) -> ParseResult<f64> {
    preceded(separator, double)(input)
}

fn command(input: &str) -> ParseResult<Command<'_>> {
    let (input, _) = ws(input)?;
    let at = input;
    let (input, letter) = context("path command", one_of("MmLlHhVvCcSsQqTtZz"))(input)?;
    let (input, args) = many0(number)(input)?;
    Ok((input, Command { at, letter, args }))
}

fn path_data(input: &str) -> ParseResult<Vec<Command<'_>>> {
    terminated(many0(command), tuple((ws, opt(tag(";")), ws)))(input)
}

fn format_verbose_error(err: &VerboseError<&str>) -> String {
    let mut parts = Vec::new();
    for (input, kind) in &err.errors {
        match kind {
            VerboseErrorKind::Context(ctx) => parts.push(format!("in {}", ctx)),
            VerboseErrorKind::Char(c) => {
                let preview: String = input.chars().take(20).collect();
                parts.push(format!("expected '{}' near \"{}\"", c, preview));
            }
            VerboseErrorKind::Nom(ek) => {
                let preview: String = input.chars().take(20).collect();
                parts.push(format!("unexpected input ({:?}) near \"{}\"", ek, preview));
            }
        }
    }
    if parts.is_empty() {
        "unknown parse error".to_string()
    } else {
        parts.join(", ")
    }
}

/// Parses SVG path data into contours. Each move command starts a new one.
pub fn parse(data: &str) -> Result<Vec<Path>> {
    let offset = |rest: &str| data.len() - rest.len();
    let (_, commands) = all_consuming(path_data)(data)
        .finish()
        .map_err(|err| PathError::Parse {
            position: err.errors.first().map_or(0, |(rest, _)| offset(rest)),
            message: format_verbose_error(&err),
        })?;

    let mut builder = Builder::default();
    for command in &commands {
        builder
            .apply(command)
            .map_err(|message| PathError::Parse {
                position: offset(command.at),
                message,
            })?;
    }
    let paths = builder.finish();
    tracing::trace!("svg: parsed {} commands into {} contours", commands.len(), paths.len());
    Ok(paths)
}

#[derive(Default)]
struct Builder {
    paths: Vec<Path>,
    current: Option<Path>,
    position: Point,
    start: Point,
    /// Absolute second control point of the previous cubic command
    cubic_control: Option<Point>,
    /// Absolute control point of the previous quadratic command
    quad_control: Option<Point>,
}

impl Builder {
    fn apply(&mut self, command: &Command<'_>) -> std::result::Result<(), String> {
        let upper = command.letter.to_ascii_uppercase();
        let relative = command.letter.is_ascii_lowercase();
        let arity = match upper {
            'M' | 'L' | 'T' => 2,
            'H' | 'V' => 1,
            'C' => 6,
            'S' | 'Q' => 4,
            _ => 0,
        };
        if arity == 0 {
            if !command.args.is_empty() {
                return Err(format!("'{}' takes no arguments", command.letter));
            }
            self.close();
            return Ok(());
        }
        if command.args.is_empty() || command.args.len() % arity != 0 {
            return Err(format!(
                "'{}' expects a multiple of {} numbers, found {}",
                command.letter,
                arity,
                command.args.len()
            ));
        }
        if upper != 'M' && self.current.is_none() && self.paths.is_empty() {
            return Err("path data must begin with a move command".to_string());
        }

        for (i, args) in command.args.chunks(arity).enumerate() {
            let base = if relative { self.position } else { Point::ZERO };
            let point = |x: f64, y: f64| base + Point::new(x, y);
            match upper {
                // Coordinates after the first move pair are implicit lines
                'M' if i == 0 => self.move_to(point(args[0], args[1])),
                'M' | 'L' => self.line_to(point(args[0], args[1])),
                'H' => {
                    let x = if relative { self.position.x + args[0] } else { args[0] };
                    self.line_to(Point::new(x, self.position.y));
                }
                'V' => {
                    let y = if relative { self.position.y + args[0] } else { args[0] };
                    self.line_to(Point::new(self.position.x, y));
                }
                'C' => self.cubic_to(
                    point(args[0], args[1]),
                    point(args[2], args[3]),
                    point(args[4], args[5]),
                ),
                'S' => {
                    let c1 = self.reflect(self.cubic_control);
                    self.cubic_to(c1, point(args[0], args[1]), point(args[2], args[3]));
                }
                'Q' => self.quad_to(point(args[0], args[1]), point(args[2], args[3])),
                'T' => {
                    let control = self.reflect(self.quad_control);
                    self.quad_to(control, point(args[0], args[1]));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn reflect(&self, control: Option<Point>) -> Point {
        control.map_or(self.position, |c| self.position * 2.0 - c)
    }

    fn move_to(&mut self, point: Point) {
        self.finish_current();
        self.current = Some(Path::from_segments(vec![Segment::corner(point)], false));
        self.position = point;
        self.start = point;
        self.cubic_control = None;
        self.quad_control = None;
    }

    /// The open contour, restarting at the current position after a close
    fn current(&mut self) -> &mut Path {
        let position = self.position;
        self.current
            .get_or_insert_with(|| Path::from_segments(vec![Segment::corner(position)], false))
    }

    fn line_to(&mut self, point: Point) {
        self.current().add(Segment::corner(point));
        self.position = point;
        self.cubic_control = None;
        self.quad_control = None;
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, point: Point) {
        let position = self.position;
        let path = self.current();
        if let Some(last) = path.last_segment_mut() {
            last.handle_out = c1 - position;
        }
        path.add(Segment::new(point, c2 - point, Point::ZERO));
        self.position = point;
        self.cubic_control = Some(c2);
        self.quad_control = None;
    }

    fn quad_to(&mut self, control: Point, point: Point) {
        let position = self.position;
        let c1 = position + (control - position) * (2.0 / 3.0);
        let c2 = point + (control - point) * (2.0 / 3.0);
        self.cubic_to(c1, c2, point);
        self.cubic_control = None;
        self.quad_control = Some(control);
    }

    fn close(&mut self) {
        if let Some(mut path) = self.current.take() {
            path.close_path(GEOMETRIC_EPSILON);
            self.paths.push(path);
        }
        self.position = self.start;
        self.cubic_control = None;
        self.quad_control = None;
    }

    fn finish_current(&mut self) {
        if let Some(path) = self.current.take() {
            self.paths.push(path);
        }
    }

    fn finish(mut self) -> Vec<Path> {
        self.finish_current();
        self.paths
    }
}

/// Formats a number with at most `precision` decimals and no trailing zeros
fn format_number(value: f64, precision: usize) -> String {
    let mut text = format!("{:.*}", precision, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

fn format_pair(point: Point, precision: usize) -> String {
    format!(
        "{},{}",
        format_number(point.x, precision),
        format_number(point.y, precision)
    )
}

/// Writes contours as SVG path data: an absolute move per contour followed
/// by relative commands, with `z` closing closed contours.
pub fn format(paths: &[Path], precision: usize) -> String {
    let mut out = String::new();
    for path in paths {
        let segments = path.segments();
        let Some(first) = segments.first() else {
            continue;
        };
        out.push('M');
        out.push_str(&format_pair(first.point, precision));
        let push_curve = |from: &Segment, to: &Segment, out: &mut String| {
            let delta = to.point - from.point;
            if from.handle_out.is_zero() && to.handle_in.is_zero() {
                if delta.y == 0.0 {
                    out.push('h');
                    out.push_str(&format_number(delta.x, precision));
                } else if delta.x == 0.0 {
                    out.push('v');
                    out.push_str(&format_number(delta.y, precision));
                } else {
                    out.push('l');
                    out.push_str(&format_pair(delta, precision));
                }
            } else {
                out.push('c');
                out.push_str(&format_pair(from.handle_out, precision));
                out.push(' ');
                out.push_str(&format_pair(delta + to.handle_in, precision));
                out.push(' ');
                out.push_str(&format_pair(delta, precision));
            }
        };
        for pair in segments.windows(2) {
            push_curve(&pair[0], &pair[1], &mut out);
        }
        if path.is_closed() {
            // A straight closing curve is implied by `z`
            if let Some(last) = segments.last().filter(|_| segments.len() > 1) {
                if !(last.handle_out.is_zero() && first.handle_in.is_zero()) {
                    push_curve(last, first, &mut out);
                }
            }
            out.push('z');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_and_relative_lines() {
        let paths = parse("M0,0 L10,0 l0,10 H0 z").unwrap();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert!(path.is_closed());
        assert_eq!(path.len(), 4);
        assert_eq!(path.segments()[2].point, Point::new(10.0, 10.0));
        assert!((path.area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_separators_and_repeats() {
        let paths = parse("m1-2 3.5.5 1e1,0").unwrap();
        let points: Vec<Point> = paths[0].segments().iter().map(|s| s.point).collect();
        assert_eq!(
            points,
            vec![Point::new(1.0, -2.0), Point::new(4.5, -1.5), Point::new(14.5, -1.5)]
        );
        assert!(!paths[0].is_closed());
    }

    #[test]
    fn test_each_move_starts_a_contour() {
        let paths = parse("M0 0h10v10z M20 0h10v10z").unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[1].segments()[0].point, Point::new(20.0, 0.0));
    }

    #[test]
    fn test_closing_point_is_merged() {
        let paths = parse("M0 0 L10 0 L10 10 L0 0 Z").unwrap();
        assert_eq!(paths[0].len(), 3);
    }

    #[test]
    fn test_quadratic_is_elevated() {
        let paths = parse("M0 0 Q 3 3 6 0").unwrap();
        let segments = paths[0].segments();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].handle_out.is_close(Point::new(2.0, 2.0), 1e-12));
        assert!(segments[1].handle_in.is_close(Point::new(-2.0, 2.0), 1e-12));
    }

    #[test]
    fn test_smooth_cubic_reflects_control() {
        let paths = parse("M0 0 C0 10 10 10 10 0 S20 -10 20 0").unwrap();
        let segments = paths[0].segments();
        assert!(segments[1].handle_out.is_close(Point::new(0.0, -10.0), 1e-12));
    }

    #[test]
    fn test_errors_report_position() {
        assert!(matches!(
            parse("L10 10"),
            Err(PathError::Parse { position: 0, .. })
        ));
        assert!(matches!(
            parse("M0 0 L10"),
            Err(PathError::Parse { position: 5, .. })
        ));
        assert!(matches!(
            parse("M0 0 X 1 1"),
            Err(PathError::Parse { position: 5, .. })
        ));
    }

    #[test]
    fn test_format_uses_relative_commands() {
        let paths = parse("M0,0 L10,0 L10,10 L0,10 Z").unwrap();
        assert_eq!(format(&paths, 5), "M0,0h10v10h-10z");
    }

    #[test]
    fn test_format_trims_numbers() {
        assert_eq!(format_number(1.50000, 3), "1.5");
        assert_eq!(format_number(-0.0001, 2), "0");
        assert_eq!(format_number(2.0, 0), "2");
    }

    #[test]
    fn test_curves_survive_a_round_trip() {
        let data = "M0,0c0,-5.5 4.5,-10 10,-10c5.5,0 10,4.5 10,10z";
        let paths = parse(data).unwrap();
        assert_eq!(format(&paths, 4), data);
    }
}
