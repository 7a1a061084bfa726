use std::num::ParseIntError;

use clap::ArgMatches;
use power_probe::{Selection, SelectionError};

pub fn parse_u32(input: &str) -> Result<u32, ParseIntError> {
    parse_int::parse(input)
}

pub fn parse_u16(input: &str) -> Result<u16, ParseIntError> {
    parse_int::parse(input)
}

#[derive(Clone, Copy)]
enum Level {
    Processor,
    Chip,
    Thread,
}

/// Rebuild the nested selection from the flat `-p`/`-c`/`-t` occurrences,
/// in command line order. A chip selector attaches to the most recent
/// processor selector and a thread selector to the most recent chip, so
/// `-p 0 -c 1 -t 0 -p 1` narrows processor 0 down to one thread while
/// taking all of processor 1. A dangling `-c` or `-t` is an error.
pub fn selection_from_matches(
    matches: &ArgMatches,
    all: bool,
) -> Result<Selection, SelectionError> {
    let mut selection = Selection::new();
    if all {
        return Ok(selection);
    }

    let mut selectors: Vec<(usize, Level, u32)> = Vec::new();
    for (id, level) in [
        ("processor", Level::Processor),
        ("chip", Level::Chip),
        ("thread", Level::Thread),
    ] {
        let Some(indices) = matches.indices_of(id) else {
            continue;
        };
        let values = matches.get_many::<u32>(id).expect("indices imply values");
        selectors.extend(indices.zip(values).map(|(at, &value)| (at, level, value)));
    }
    selectors.sort_by_key(|&(at, _, _)| at);

    let mut processor: Option<u32> = None;
    let mut chip: Option<u32> = None;
    for (_, level, value) in selectors {
        match level {
            Level::Processor => {
                selection.processor(value)?;
                processor = Some(value);
                chip = None;
            }
            Level::Chip => {
                let p = processor.ok_or(SelectionError::MissingProcessor)?;
                selection.chip(p, value)?;
                chip = Some(value);
            }
            Level::Thread => {
                let p = processor.ok_or(SelectionError::MissingProcessor)?;
                let c = chip.ok_or(SelectionError::MissingChip)?;
                selection.thread(p, c, value)?;
            }
        }
    }

    Ok(selection)
}
