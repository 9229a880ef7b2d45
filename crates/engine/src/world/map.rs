use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::{Element, GridError, GridState, Position};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map has no rows")]
    Empty,
    #[error("unknown map character '{character}' at line {line}, column {column}")]
    UnknownCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("map has no avatar start marker")]
    MissingAvatar,
    #[error("map has a second avatar start marker at line {line}, column {column}")]
    DuplicateAvatar { line: usize, column: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
}

fn element_for(character: char) -> Option<Element> {
    match character {
        ' ' => Some(Element::EMPTY),
        '▤' | '#' => Some(Element::WALL),
        '♣' | '*' => Some(Element::VEGETATION),
        '☠' | 'E' => Some(Element::ENEMY),
        _ => None,
    }
}

fn is_avatar_marker(character: char) -> bool {
    matches!(character, '☺' | 'P')
}

impl GridState {
    /// Parses the textual map format: one row per line, the widest line sets the
    /// width and shorter rows are padded with empty cells. The avatar marker
    /// becomes the avatar start and leaves an empty cell behind.
    pub fn from_map_text(text: &str) -> Result<Self, MapError> {
        let rows = text
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(MapError::Empty);
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut avatar = None;
        for (y, row) in rows.iter().enumerate() {
            for x in 0..width {
                let character = row.get(x).copied().unwrap_or(' ');
                if is_avatar_marker(character) {
                    if avatar.is_some() {
                        return Err(MapError::DuplicateAvatar {
                            line: y + 1,
                            column: x + 1,
                        });
                    }
                    avatar = Some(Position::new(x as i32, y as i32));
                    cells.push(Element::EMPTY);
                    continue;
                }
                let element = element_for(character).ok_or(MapError::UnknownCharacter {
                    character,
                    line: y + 1,
                    column: x + 1,
                })?;
                cells.push(element);
            }
        }

        let avatar = avatar.ok_or(MapError::MissingAvatar)?;
        Ok(GridState::new(
            width as i32,
            height as i32,
            cells,
            avatar,
        )?)
    }
}

pub fn load_map(path: &Path) -> Result<GridState, MapError> {
    let text = fs::read_to_string(path).map_err(|source| MapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = GridState::from_map_text(&text)?;
    info!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        avatar_x = grid.avatar().x,
        avatar_y = grid.avatar().y,
        "map_loaded"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_walls_vegetation_and_avatar() {
        let grid = GridState::from_map_text("▤▤▤▤\n▤☺♣▤\n▤▤▤▤\n").expect("map");
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.avatar(), Position::new(1, 1));
        assert!(grid.is_vacant(Position::new(1, 1)));
        assert_eq!(grid.cell(Position::new(2, 1)), Some(Element::VEGETATION));
        assert_eq!(grid.cell(Position::new(0, 0)), Some(Element::WALL));
    }

    #[test]
    fn short_rows_are_padded() {
        let grid = GridState::from_map_text("#####\n#P\n#####").expect("map");
        assert_eq!(grid.width(), 5);
        assert!(grid.is_vacant(Position::new(4, 1)));
    }

    #[test]
    fn ascii_aliases_are_accepted() {
        let grid = GridState::from_map_text("#*E\nP  ").expect("map");
        assert_eq!(grid.cell(Position::new(0, 0)), Some(Element::WALL));
        assert_eq!(grid.cell(Position::new(1, 0)), Some(Element::VEGETATION));
        assert_eq!(grid.cell(Position::new(2, 0)), Some(Element::ENEMY));
    }

    #[test]
    fn unknown_character_reports_location() {
        let err = GridState::from_map_text("##\n#?P").expect_err("unknown");
        match err {
            MapError::UnknownCharacter {
                character,
                line,
                column,
            } => {
                assert_eq!(character, '?');
                assert_eq!(line, 2);
                assert_eq!(column, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_and_duplicate_avatar_are_rejected() {
        assert!(matches!(
            GridState::from_map_text("###\n# #"),
            Err(MapError::MissingAvatar)
        ));
        assert!(matches!(
            GridState::from_map_text("P P"),
            Err(MapError::DuplicateAvatar { line: 1, column: 3 })
        ));
        assert!(matches!(GridState::from_map_text(""), Err(MapError::Empty)));
    }

    #[test]
    fn load_map_reads_file_and_reports_missing_path() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("map.txt");
        fs::write(&path, "▤▤▤\n▤☺▤\n▤▤▤\n").expect("write map");

        let grid = load_map(&path).expect("load");
        assert_eq!(grid.avatar(), Position::new(1, 1));

        let missing = temp.path().join("nope.txt");
        assert!(matches!(load_map(&missing), Err(MapError::Read { .. })));
    }
}
