//! Line-delimited stdin/stdout wire framing (§4.J / §6).
//!
//! This is the only module that knows the wire format is 1-based while
//! the rest of the crate is 0-based, and the only one that touches
//! [`std::io`] directly.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::config::Header;
use crate::placement_init::HintTables;
use crate::planner::PlanOp;

/// Errors raised while reading or writing the wire protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The workload's echoed step counter disagreed with the engine's.
    #[error("protocol desync: expected step {expected}, got {got}")]
    Desync { expected: u64, got: u64 },

    /// An I/O error occurred reading or writing a line.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line did not parse as the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

fn read_line<R: BufRead>(r: &mut R) -> Result<String, ProtocolError> {
    let mut line = String::new();
    let n = r.read_line(&mut line)?;
    if n == 0 {
        return Err(ProtocolError::Parse("unexpected end of input".into()));
    }
    Ok(line.trim().to_string())
}

fn parse_ints(line: &str) -> Result<Vec<i64>, ProtocolError> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<i64>()
                .map_err(|e| ProtocolError::Parse(format!("{e}: {tok:?}")))
        })
        .collect()
}

/// Reads `T M N V G K` followed by the three `M x S` delete/write/read
/// hint tables.
pub fn read_header<R: BufRead>(r: &mut R) -> Result<(Header, HintTables), ProtocolError> {
    let line = read_line(r)?;
    let nums = parse_ints(&line)?;
    if nums.len() != 6 {
        return Err(ProtocolError::Parse(format!(
            "expected 6 header fields, got {}",
            nums.len()
        )));
    }
    let header = Header {
        t: nums[0] as u64,
        m: nums[1] as usize,
        n: nums[2] as usize,
        v: nums[3] as usize,
        g: nums[4] as u32,
        k: nums[5] as usize,
    };
    let s = header.bucket_count();
    let deletes = read_table(r, header.m, s)?;
    let writes = read_table(r, header.m, s)?;
    let reads = read_table(r, header.m, s)?;
    Ok((header, HintTables { deletes, writes, reads }))
}

fn read_table<R: BufRead>(r: &mut R, rows: usize, cols: usize) -> Result<Vec<Vec<u64>>, ProtocolError> {
    let mut table = Vec::with_capacity(rows);
    for _ in 0..rows {
        let line = read_line(r)?;
        let nums = parse_ints(&line)?;
        if nums.len() != cols {
            return Err(ProtocolError::Parse(format!(
                "expected {cols} columns, got {}",
                nums.len()
            )));
        }
        table.push(nums.into_iter().map(|x| x.max(0) as u64).collect());
    }
    Ok(table)
}

/// Acknowledges a successfully parsed header.
pub fn write_ack<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "OK")
}

/// Echoes the step's `TIMESTAMP` line back, as the driver expects before
/// it sends the step's deletes/writes/reads.
pub fn write_timestamp_ack<W: Write>(w: &mut W, step: u64) -> io::Result<()> {
    writeln!(w, "TIMESTAMP {step}")
}

/// One step's worth of input from the workload driver.
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    pub timestamp: u64,
    pub deletes: Vec<u32>,
    pub writes: Vec<(u32, usize, usize)>,
    pub reads: Vec<(u32, u32)>,
}

/// Reads one step's `TIMESTAMP`/delete/write/read batches.
pub fn read_step_input<R: BufRead>(
    r: &mut R,
    expected_step: u64,
) -> Result<StepInput, ProtocolError> {
    let line = read_line(r)?;
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("TIMESTAMP") => {}
        _ => return Err(ProtocolError::Parse(format!("expected TIMESTAMP line, got {line:?}"))),
    }
    let got: u64 = tokens
        .next()
        .ok_or_else(|| ProtocolError::Parse("missing TIMESTAMP value".into()))?
        .parse()
        .map_err(|e| ProtocolError::Parse(format!("{e}")))?;
    if got != expected_step {
        return Err(ProtocolError::Desync { expected: expected_step, got });
    }

    let n_delete: usize = read_count(r)?;
    let mut deletes = Vec::with_capacity(n_delete);
    for _ in 0..n_delete {
        deletes.push(parse_one_based_u32(&read_line(r)?)?);
    }

    let n_write: usize = read_count(r)?;
    let mut writes = Vec::with_capacity(n_write);
    for _ in 0..n_write {
        let nums = parse_ints(&read_line(r)?)?;
        if nums.len() != 3 {
            return Err(ProtocolError::Parse("write line must be 'id size tag'".into()));
        }
        writes.push(((nums[0] - 1).max(0) as u32, nums[1] as usize, (nums[2] - 1).max(0) as usize));
    }

    let n_read: usize = read_count(r)?;
    let mut reads = Vec::with_capacity(n_read);
    for _ in 0..n_read {
        let nums = parse_ints(&read_line(r)?)?;
        if nums.len() != 2 {
            return Err(ProtocolError::Parse("read line must be 'req_id obj_id'".into()));
        }
        reads.push((nums[0] as u32, (nums[1] - 1).max(0) as u32));
    }

    Ok(StepInput { timestamp: got, deletes, writes, reads })
}

fn read_count<R: BufRead>(r: &mut R) -> Result<usize, ProtocolError> {
    parse_one_u32(&read_line(r)?).map(|x| x as usize)
}

fn parse_one_u32(line: &str) -> Result<u32, ProtocolError> {
    line.trim()
        .parse::<u32>()
        .map_err(|e| ProtocolError::Parse(format!("{e}: {line:?}")))
}

/// Parses a single 1-based wire id and converts it to a 0-based one.
fn parse_one_based_u32(line: &str) -> Result<u32, ProtocolError> {
    parse_one_u32(line).map(|x| x.saturating_sub(1))
}

/// A newly-placed object's replicas, ready for wire emission (0-based).
#[derive(Debug, Clone)]
pub struct NewObjectPlacement {
    pub object_id: u32,
    pub replicas: [(usize, Vec<usize>); 3],
}

/// Everything a single step produces, in wire order (§6).
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub cancelled_deletes: Vec<u32>,
    pub new_objects: Vec<NewObjectPlacement>,
    pub head_ops: Vec<Vec<PlanOp>>,
    pub completed: Vec<u32>,
    pub stale_busy: Vec<u32>,
    /// `Some(per_disk_swaps)` only on a compaction step.
    pub compaction: Option<Vec<Vec<(usize, usize)>>>,
}

/// Renders one head's ops as the wire's `{r, p, j <addr+1>}*#` string.
pub fn format_head_ops(ops: &[PlanOp]) -> String {
    let mut s = String::new();
    for op in ops {
        match op {
            PlanOp::Read { .. } => s.push('r'),
            PlanOp::Pass => s.push('p'),
            PlanOp::Jump { addr } => {
                s.push('j');
                s.push(' ');
                s.push_str(&(addr + 1).to_string());
                s.push(' ');
            }
        }
    }
    s.push('#');
    s
}

/// Serialises one step's output to the wire.
pub fn write_step_output<W: Write>(w: &mut W, out: &StepOutput) -> io::Result<()> {
    writeln!(w, "{}", out.cancelled_deletes.len())?;
    for id in &out.cancelled_deletes {
        writeln!(w, "{id}")?;
    }

    for obj in &out.new_objects {
        writeln!(w, "{}", obj.object_id + 1)?;
        for (disk, blocks) in &obj.replicas {
            write!(w, "{}", disk + 1)?;
            for addr in blocks {
                write!(w, " {}", addr + 1)?;
            }
            writeln!(w)?;
        }
    }

    for ops in &out.head_ops {
        writeln!(w, "{}", format_head_ops(ops))?;
    }

    writeln!(w, "{}", out.completed.len())?;
    for id in &out.completed {
        writeln!(w, "{id}")?;
    }

    writeln!(w, "{}", out.stale_busy.len())?;
    for id in &out.stale_busy {
        writeln!(w, "{id}")?;
    }

    if let Some(per_disk) = &out.compaction {
        for swaps in per_disk {
            writeln!(w, "{}", swaps.len())?;
            for (from, to) in swaps {
                writeln!(w, "{} {}", from + 1, to + 1)?;
            }
        }
    }

    w.flush()
}
