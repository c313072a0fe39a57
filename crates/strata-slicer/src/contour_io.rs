//! Plain-text contour files.
//!
//! One line per layer. Contours within a layer are separated by `;`,
//! vertices within a contour by `,`, and a vertex is three
//! space-separated coordinates written with three decimals:
//!
//! ```text
//! 0.000 0.000 0.400,10.000 0.000 0.400,10.000 10.000 0.400;2.000 2.000 0.400,...
//! ```
//!
//! A layer without contours is an empty line, so layer indices survive a
//! round trip.

use std::fs;
use std::path::Path;

use strata_math::Point3;
use tracing::info;

use crate::contour::Contour;
use crate::error::{Result, SlicerError};

const CONTOUR_SEPARATOR: char = ';';
const VERTEX_SEPARATOR: char = ',';

/// Serialize layers of contours to the text format.
pub fn format_contours<L: AsRef<[Contour]>>(layers: &[L]) -> String {
    let mut out = String::new();
    for layer in layers {
        let line = layer
            .as_ref()
            .iter()
            .map(format_contour)
            .collect::<Vec<_>>()
            .join(&CONTOUR_SEPARATOR.to_string());
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn format_contour(contour: &Contour) -> String {
    contour
        .points()
        .iter()
        .map(|v| format!("{:.3} {:.3} {:.3}", v.x, v.y, v.z))
        .collect::<Vec<_>>()
        .join(&VERTEX_SEPARATOR.to_string())
}

/// Parse the text format back into layers of contours.
///
/// Any vertex that is not exactly three whitespace-separated floats is an
/// error naming its layer, contour and vertex index.
pub fn parse_contours(text: &str) -> Result<Vec<Vec<Contour>>> {
    text.lines()
        .enumerate()
        .map(|(layer, line)| {
            if line.trim().is_empty() {
                return Ok(Vec::new());
            }
            line.split(CONTOUR_SEPARATOR)
                .enumerate()
                .map(|(contour, text)| {
                    text.split(VERTEX_SEPARATOR)
                        .enumerate()
                        .map(|(vertex, token)| parse_vertex(token, layer, contour, vertex))
                        .collect::<Result<Vec<_>>>()
                        .map(Contour::new)
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn parse_vertex(token: &str, layer: usize, contour: usize, vertex: usize) -> Result<Point3> {
    let error = || SlicerError::ContourParse {
        layer,
        contour,
        vertex,
        token: token.to_string(),
    };

    let coords = token
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| error())?;

    match coords.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(error()),
    }
}

/// Write layers of contours to a file.
pub fn write_contours<L: AsRef<[Contour]>>(path: impl AsRef<Path>, layers: &[L]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_contours(layers))?;
    info!(path = %path.display(), layers = layers.len(), "Saved contours");
    Ok(())
}

/// Load layers of contours from a file.
pub fn load_contours(path: impl AsRef<Path>) -> Result<Vec<Vec<Contour>>> {
    let text = fs::read_to_string(path)?;
    parse_contours(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn contour(points: &[[f64; 3]]) -> Contour {
        Contour::new(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect())
    }

    #[test]
    fn test_format() {
        let layers = vec![vec![
            contour(&[[0.0, 0.0, 0.4], [1.0, 0.0, 0.4], [0.0, 1.0, 0.4]]),
            contour(&[[5.0, 5.0, 0.4], [6.0, 5.0, 0.4], [5.0, 6.0, 0.4]]),
        ]];
        assert_eq!(
            format_contours(&layers),
            "0.000 0.000 0.400,1.000 0.000 0.400,0.000 1.000 0.400;\
             5.000 5.000 0.400,6.000 5.000 0.400,5.000 6.000 0.400\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let layers = vec![
            vec![contour(&[[0.1234, 1.0, 0.0], [2.0, 3.9876, 0.0], [-4.5, 5.0, 0.0]])],
            vec![],
            vec![
                contour(&[[0.0, 0.0, 0.8], [1.0, 0.0, 0.8], [1.0, 1.0, 0.8], [0.0, 1.0, 0.8]]),
                contour(&[[3.0, 3.0, 0.8], [4.0, 3.0, 0.8], [3.5, 4.0, 0.8]]),
            ],
        ];
        let loaded = parse_contours(&format_contours(&layers)).unwrap();

        assert_eq!(loaded.len(), layers.len());
        for (got_layer, want_layer) in loaded.iter().zip(&layers) {
            assert_eq!(got_layer.len(), want_layer.len());
            for (got, want) in got_layer.iter().zip(want_layer) {
                assert_eq!(got.len(), want.len());
                for (a, b) in got.points().iter().zip(want.points()) {
                    assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-3);
                    assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-3);
                    assert_abs_diff_eq!(a.z, b.z, epsilon = 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_parse_accepts_any_float() {
        let layers = parse_contours("1e-3 2 -3.25,4 5 6,7 8 9\r\n").unwrap();
        assert_eq!(layers.len(), 1);
        let first = layers[0][0].points()[0];
        assert_abs_diff_eq!(first.x, 0.001);
        assert_abs_diff_eq!(first.z, -3.25);
    }

    #[test]
    fn test_parse_reports_position() {
        let text = "0 0 0,1 0 0,0 1 0\n0 0 1,1 0 1;0 0 1,1 x 1,0 1 1\n";
        match parse_contours(text) {
            Err(SlicerError::ContourParse {
                layer,
                contour,
                vertex,
                token,
            }) => {
                assert_eq!((layer, contour, vertex), (1, 1, 1));
                assert_eq!(token, "1 x 1");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert!(matches!(
            parse_contours("0 0,1 0 0,0 1 0\n"),
            Err(SlicerError::ContourParse { vertex: 0, .. })
        ));
        assert!(matches!(
            parse_contours("0 0 0 0\n"),
            Err(SlicerError::ContourParse { .. })
        ));
        assert!(matches!(
            parse_contours("0 0 0,,1 1 1\n"),
            Err(SlicerError::ContourParse { vertex: 1, .. })
        ));
    }
}
