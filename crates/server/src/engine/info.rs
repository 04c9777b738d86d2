//! Parsing of UCI `info` lines.

/// Engine score, always from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated)
    Mate(i32),
}

/// Search statistics accumulated over all `info` lines of one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub score: Option<Score>,
    /// Principal variation moves in UCI notation
    pub pv: Vec<String>,
    score_is_bound: bool,
}

impl SearchInfo {
    /// Fold one engine output line into the accumulated info.
    ///
    /// Fields present on the line replace earlier values. Lines that are not
    /// `info`, `info string` lines, and secondary multipv lines are ignored.
    pub fn merge_line(&mut self, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"info") || parts.get(1) == Some(&"string") {
            return;
        }
        if parse_u64(&parts, "multipv").is_some_and(|idx| idx != 1) {
            return;
        }

        if let Some(depth) = parse_u64(&parts, "depth") {
            self.depth = Some(depth as u32);
        }
        if let Some(seldepth) = parse_u64(&parts, "seldepth") {
            self.seldepth = Some(seldepth as u32);
        }
        if let Some(nodes) = parse_u64(&parts, "nodes") {
            self.nodes = Some(nodes);
        }
        if let Some(nps) = parse_u64(&parts, "nps") {
            self.nps = Some(nps);
        }

        if let Some((score, is_bound)) = parse_score(&parts) {
            // A bound never replaces an exact score.
            if !is_bound || self.score.is_none() || self.score_is_bound {
                self.score = Some(score);
                self.score_is_bound = is_bound;
            }
        }

        let pv = parse_pv(&parts);
        if !pv.is_empty() {
            self.pv = pv;
        }
    }
}

/// Value following `key`, stopping at a trailing `string` section.
fn parse_u64(parts: &[&str], key: &str) -> Option<u64> {
    for (i, part) in parts.iter().enumerate() {
        if *part == "string" || *part == "pv" {
            return None;
        }
        if *part == key && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse `score cp N` / `score mate N`, with an optional bound marker.
fn parse_score(parts: &[&str]) -> Option<(Score, bool)> {
    let i = parts.iter().position(|p| *p == "score")?;
    let kind = *parts.get(i + 1)?;
    let value: i32 = parts.get(i + 2)?.parse().ok()?;
    let score = match kind {
        "cp" => Score::Cp(value),
        "mate" => Score::Mate(value),
        _ => return None,
    };
    let is_bound = matches!(
        parts.get(i + 3).copied(),
        Some("lowerbound") | Some("upperbound")
    );
    Some((score, is_bound))
}

/// Parse PV moves from info line
fn parse_pv(parts: &[&str]) -> Vec<String> {
    let mut in_pv = false;
    let mut moves = Vec::new();

    for part in parts {
        if *part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || *part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}
