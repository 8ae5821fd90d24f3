use std::{fs::File, io::Read, path::Path};
use tracing::info;

use crate::{error::InputError, types::PlayerRef};

/// Reads players from a CSV with `Name` and `URL` columns. Other columns are
/// ignored.
pub fn read_players<R: Read>(reader: R) -> Result<Vec<PlayerRef>, InputError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let players = rdr
        .deserialize::<PlayerRef>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(players)
}

pub fn read_players_file(path: &Path) -> Result<Vec<PlayerRef>, InputError> {
    let players = read_players(File::open(path)?)?;
    info!("Read {} players from {:?}", players.len(), path);
    Ok(players)
}
