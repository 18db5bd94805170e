//! Whitespace-separated text loaders.
//!
//! # Input directory
//!
//! | File          | Shape               | Meaning                                              |
//! |---------------|---------------------|------------------------------------------------------|
//! | `network.txt` | N × N floats        | edge length from row to column; negative = no edge   |
//! | `edgecap.txt` | N × N integers      | edge capacity in vehicle-length units; 0 = non-edge  |
//! | `demand.txt`  | N × N integers      | passengers at row bound for column                   |
//! | `stopcap.txt` | N integers          | boarding slots per node; −1 = unlimited (optional)   |
//! | `route.txt`   | one route per line  | ordered node ids                                     |
//! | `fleet.txt`   | one class per line  | `name capacity length speed count`                   |
//!
//! Blank lines are ignored everywhere.  Diagonal entries of `network.txt`
//! never produce self-loop edges.  When `stopcap.txt` is absent every node
//! gets one boarding slot.  An edge whose capacity entry is 0 (or negative)
//! is given capacity 1 with a warning.
//!
//! The reader-based entry points take [`Source`]s, so tests can feed byte
//! slices and still get `file:line` diagnostics.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use tsim_core::NodeId;

use crate::{Fleet, FleetBuilder, Network, NetworkBuilder, NetworkError, NetworkResult};

// ── File set ──────────────────────────────────────────────────────────────────

/// Paths of the input files of one scenario.
#[derive(Clone, Debug)]
pub struct InputFiles {
    pub network: PathBuf,
    pub edgecap: PathBuf,
    pub demand:  PathBuf,
    pub stopcap: Option<PathBuf>,
    pub route:   PathBuf,
    pub fleet:   PathBuf,
}

impl InputFiles {
    /// The standard file names inside `dir`.  `stopcap` is only set if the
    /// file exists.
    pub fn in_dir(dir: &Path) -> Self {
        let stopcap = dir.join("stopcap.txt");
        Self {
            network: dir.join("network.txt"),
            edgecap: dir.join("edgecap.txt"),
            demand:  dir.join("demand.txt"),
            stopcap: stopcap.exists().then_some(stopcap),
            route:   dir.join("route.txt"),
            fleet:   dir.join("fleet.txt"),
        }
    }
}

/// A named line-oriented input.
pub struct Source<R> {
    pub name:   String,
    pub reader: R,
}

impl<R: BufRead> Source<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self { name: name.into(), reader }
    }
}

impl Source<BufReader<File>> {
    pub fn open(path: &Path) -> NetworkResult<Self> {
        Ok(Self::new(path.display().to_string(), BufReader::new(File::open(path)?)))
    }
}

/// Load the network described by `files`.
pub fn load_network(files: &InputFiles) -> NetworkResult<Network> {
    let stopcap = files.stopcap.as_deref().map(Source::open).transpose()?;
    let net = network_from_sources(
        Source::open(&files.network)?,
        Source::open(&files.edgecap)?,
        Source::open(&files.demand)?,
        stopcap,
        Source::open(&files.route)?,
    )?;
    info!(
        nodes = net.node_count(),
        edges = net.edge_count(),
        routes = net.route_count(),
        demand = net.total_demand(),
        "network loaded"
    );
    Ok(net)
}

/// Load the fleet manifest at `path`.
pub fn load_fleet(path: &Path) -> NetworkResult<Fleet> {
    let fleet = fleet_from_source(Source::open(path)?)?;
    info!(vehicles = fleet.len(), "fleet loaded");
    Ok(fleet)
}

// ── Reader-based entry points ─────────────────────────────────────────────────

/// Build a network from already-open sources.
pub fn network_from_sources<R: BufRead>(
    network: Source<R>,
    edgecap: Source<R>,
    demand:  Source<R>,
    stopcap: Option<Source<R>>,
    route:   Source<R>,
) -> NetworkResult<Network> {
    let lengths: Matrix<f64> = read_rows(network)?;
    let n = lengths.rows.len();
    lengths.check_square(n)?;

    let caps: Matrix<i64> = read_rows(edgecap)?;
    caps.check_square(n)?;

    let demands: Matrix<i64> = read_rows(demand)?;
    demands.check_square(n)?;

    let slots = match stopcap {
        Some(src) => read_stop_capacities(src, n)?,
        None => vec![Some(1); n],
    };

    let mut b = NetworkBuilder::new();
    for slot in slots {
        b.add_node(slot);
    }

    for (i, (_, row)) in lengths.rows.iter().enumerate() {
        for (j, &len) in row.iter().enumerate() {
            if i == j || len < 0.0 {
                continue;
            }
            let mut cap = caps.rows[i].1[j];
            if cap <= 0 {
                warn!(from = i, to = j, "edge has no capacity; using 1");
                cap = 1;
            }
            b.add_edge(NodeId(i as u32), NodeId(j as u32), len, cap as f64);
        }
    }

    for (i, (line, row)) in demands.rows.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            let count = u32::try_from(count)
                .map_err(|_| parse_err(&demands.name, *line, format!("demand {count} out of range")))?;
            b.set_demand(NodeId(i as u32), NodeId(j as u32), count);
        }
    }

    let routes: Matrix<u32> = read_rows(route)?;
    for (_, nodes) in routes.rows {
        b.add_route(nodes.into_iter().map(NodeId).collect());
    }

    b.build()
}

/// Parse a fleet manifest: `name capacity length speed count` per line.
pub fn fleet_from_source<R: BufRead>(src: Source<R>) -> NetworkResult<Fleet> {
    let name = src.name.clone();
    let mut b = FleetBuilder::new();
    for (line, text) in numbered_lines(src)? {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let [class, capacity, length, speed, count] = tokens.as_slice() else {
            return Err(parse_err(&name, line, format!("expected 5 fields, found {}", tokens.len())));
        };
        b.add_class(
            class,
            parse_token(capacity, &name, line)?,
            parse_token(length, &name, line)?,
            parse_token(speed, &name, line)?,
            parse_token(count, &name, line)?,
        )?;
    }
    Ok(b.build())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Parsed rows, each tagged with its 1-based line number.
struct Matrix<T> {
    name: String,
    rows: Vec<(usize, Vec<T>)>,
}

impl<T> Matrix<T> {
    fn check_square(&self, n: usize) -> NetworkResult<()> {
        if self.rows.len() != n {
            let line = self.rows.last().map_or(0, |(l, _)| *l);
            return Err(parse_err(&self.name, line, format!("expected {n} rows, found {}", self.rows.len())));
        }
        for (line, row) in &self.rows {
            if row.len() != n {
                return Err(parse_err(&self.name, *line, format!("expected {n} columns, found {}", row.len())));
            }
        }
        Ok(())
    }
}

fn parse_err(file: &str, line: usize, msg: String) -> NetworkError {
    NetworkError::Parse { file: file.to_string(), line, msg }
}

fn parse_token<T: FromStr>(tok: &str, file: &str, line: usize) -> NetworkResult<T> {
    tok.parse().map_err(|_| parse_err(file, line, format!("cannot parse `{tok}`")))
}

/// Non-blank lines with their 1-based line numbers.
fn numbered_lines<R: BufRead>(src: Source<R>) -> NetworkResult<Vec<(usize, String)>> {
    let mut out = Vec::new();
    for (i, line) in src.reader.lines().enumerate() {
        let line = line?;
        if !line.trim().is_empty() {
            out.push((i + 1, line));
        }
    }
    Ok(out)
}

fn read_rows<R: BufRead, T: FromStr>(src: Source<R>) -> NetworkResult<Matrix<T>> {
    let name = src.name.clone();
    let rows = numbered_lines(src)?
        .into_iter()
        .map(|(line, text)| {
            let row = text
                .split_whitespace()
                .map(|tok| parse_token(tok, &name, line))
                .collect::<NetworkResult<Vec<T>>>()?;
            Ok((line, row))
        })
        .collect::<NetworkResult<_>>()?;
    Ok(Matrix { name, rows })
}

fn read_stop_capacities<R: BufRead>(src: Source<R>, n: usize) -> NetworkResult<Vec<Option<u32>>> {
    let m: Matrix<i64> = read_rows(src)?;
    if m.rows.len() != n {
        let line = m.rows.last().map_or(0, |(l, _)| *l);
        return Err(parse_err(&m.name, line, format!("expected {n} rows, found {}", m.rows.len())));
    }
    m.rows
        .iter()
        .enumerate()
        .map(|(node, (line, row))| match row.as_slice() {
            [c] if *c < 0 => Ok(None),
            [0] => {
                warn!(node, "stop capacity 0 raised to 1");
                Ok(Some(1))
            }
            [c] => u32::try_from(*c)
                .map(Some)
                .map_err(|_| parse_err(&m.name, *line, format!("stop capacity {c} out of range"))),
            _ => Err(parse_err(&m.name, *line, "expected one value per line".into())),
        })
        .collect()
}
