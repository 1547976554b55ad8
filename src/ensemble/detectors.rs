//! 🔍 Pattern Detector Library
//!
//! Eleven independent, stateless heuristics. Each inspects the history
//! strictly older than a target position and either abstains (None) or
//! returns a candidate side with optional evidence metadata.
//!
//! The target index counts newest-first with -1 denoting the live frontier:
//! a detector invoked at `target` predicts the entry at `target` and may only
//! read entries at `target + 1` and older. That one-sided read is what makes
//! the same functions reusable for live prediction and lookahead-free
//! backtesting.

use crate::history::{HistoryEntry, Outcome};

/// Detector output: a candidate side plus evidence metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Side the detector votes for
    pub side: Outcome,

    /// Evidence count (run length, signature matches, ...); 0 when the
    /// heuristic carries no natural count
    pub occurrences: u32,

    /// Detector-supplied reasoning; None falls back to the per-detector
    /// default at aggregation time
    pub reason: Option<String>,
}

impl Candidate {
    fn bare(side: Outcome) -> Self {
        Self {
            side,
            occurrences: 0,
            reason: None,
        }
    }
}

/// The fixed detector registry, in evaluation (and tie-break) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Streak,
    ZigZag,
    Frequency,
    SmartBridge,
    Symmetry,
    Mirror,
    Neural,
    Wave,
    Bayesian,
    MarkovOrder4,
    BridgeBreak,
}

impl DetectorKind {
    /// Registry order is part of the contract: best-detector ties resolve to
    /// the earlier entry and the baseline path takes the first non-abstainer.
    pub const ALL: [DetectorKind; 11] = [
        DetectorKind::Streak,
        DetectorKind::ZigZag,
        DetectorKind::Frequency,
        DetectorKind::SmartBridge,
        DetectorKind::Symmetry,
        DetectorKind::Mirror,
        DetectorKind::Neural,
        DetectorKind::Wave,
        DetectorKind::Bayesian,
        DetectorKind::MarkovOrder4,
        DetectorKind::BridgeBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Streak => "Streak",
            DetectorKind::ZigZag => "ZigZag",
            DetectorKind::Frequency => "Frequency",
            DetectorKind::SmartBridge => "SmartBridge",
            DetectorKind::Symmetry => "Symmetry",
            DetectorKind::Mirror => "Mirror",
            DetectorKind::Neural => "Neural",
            DetectorKind::Wave => "Wave",
            DetectorKind::Bayesian => "Bayesian",
            DetectorKind::MarkovOrder4 => "MarkovO4",
            DetectorKind::BridgeBreak => "BridgeBreak",
        }
    }

    /// Static reason used when a candidate carries none of its own
    pub fn default_reason(&self) -> &'static str {
        match self {
            DetectorKind::Streak => "Streak run detected",
            DetectorKind::ZigZag => "Alternating 1-1 run detected",
            DetectorKind::Frequency => "Recent frequency imbalance",
            DetectorKind::SmartBridge => "Matched repeating bridge signature",
            DetectorKind::Symmetry => "Special symmetric bridge",
            DetectorKind::Mirror => "Mirror of the result two rounds back",
            DetectorKind::Neural => "Deep sequence history match",
            DetectorKind::Wave => "Periodic wave cycle",
            DetectorKind::Bayesian => "Fuzzy probability statistics",
            DetectorKind::MarkovOrder4 => "Order-4 chain statistics",
            DetectorKind::BridgeBreak => "Bridge break point detected",
        }
    }

    /// Run this detector at `target`. Insufficient history always yields
    /// None, never an error.
    pub fn evaluate(&self, history: &[HistoryEntry], target: isize) -> Option<Candidate> {
        match self {
            DetectorKind::Streak => streak(history, target),
            DetectorKind::ZigZag => zigzag(history, target),
            DetectorKind::Frequency => frequency(history, target),
            DetectorKind::SmartBridge => smart_bridge(history, target),
            DetectorKind::Symmetry => symmetry(history, target),
            DetectorKind::Mirror => mirror(history, target),
            DetectorKind::Neural => neural(history, target),
            DetectorKind::Wave => wave(history, target),
            DetectorKind::Bayesian => bayesian(history, target),
            DetectorKind::MarkovOrder4 => markov_order4(history, target),
            DetectorKind::BridgeBreak => bridge_break(history, target),
        }
    }
}

/// Outcome at a bounds-checked-by-caller newest-first index
#[inline]
fn side_at(history: &[HistoryEntry], index: isize) -> Outcome {
    history[index as usize].size
}

/// Newest-first signature of the `len` entries immediately older than `target`
fn signature_before(history: &[HistoryEntry], target: isize, len: usize) -> String {
    (1..=len as isize)
        .map(|k| side_at(history, target + k).code())
        .collect()
}

/// Continuation of a run of >= 2 identical outcomes
fn streak(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 1 {
        return None;
    }
    let prev = side_at(history, target + 1);
    let mut run = 1u32;
    let mut i = target + 2;
    while i < n {
        if side_at(history, i) == prev {
            run += 1;
        } else {
            break;
        }
        i += 1;
    }
    if run >= 2 {
        return Some(Candidate {
            side: prev,
            occurrences: run,
            reason: Some(format!("Streak of {} running", run)),
        });
    }
    None
}

/// Continuation of an alternation between the two most recent entries
fn zigzag(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 2 {
        return None;
    }
    let p1 = side_at(history, target + 1);
    let p2 = side_at(history, target + 2);
    if p1 != p2 {
        return Some(Candidate {
            side: p1.flip(),
            occurrences: 0,
            reason: Some("Alternating 1-1 run".to_string()),
        });
    }
    None
}

/// Majority side over the trailing 20 entries, outside the 40-60% band
fn frequency(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    let mut big = 0u32;
    let mut total = 0u32;
    let mut i = target + 1;
    let end = n.min(target + 21);
    while i < end {
        if side_at(history, i) == Outcome::Big {
            big += 1;
        }
        total += 1;
        i += 1;
    }
    if total < 5 {
        return None;
    }
    let ratio = f64::from(big) / f64::from(total);
    if ratio > 0.6 {
        return Some(Candidate::bare(Outcome::Big));
    }
    if ratio < 0.4 {
        return Some(Candidate::bare(Outcome::Small));
    }
    None
}

/// Exact signature repeats for window lengths 3-6, voting on what followed
/// each repeat; fires only on >= 3 matches with a >= 70% majority
fn smart_bridge(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 8 {
        return None;
    }
    let mut big_vote = 0u32;
    let mut small_vote = 0u32;
    let mut matches = 0u32;

    for len in [3usize, 4, 5, 6] {
        let sig: Vec<Outcome> = (1..=len as isize)
            .map(|k| side_at(history, target + k))
            .collect();
        let mut i = target + 2;
        while i < n - len as isize {
            let mut matched = true;
            for (k, want) in sig.iter().enumerate() {
                if side_at(history, i + k as isize) != *want {
                    matched = false;
                    break;
                }
            }
            if matched {
                if side_at(history, i - 1) == Outcome::Big {
                    big_vote += 1;
                } else {
                    small_vote += 1;
                }
                matches += 1;
            }
            i += 1;
        }
    }

    if matches < 3 {
        return None;
    }
    let reason = "Repeating bridge signature".to_string();
    if f64::from(big_vote) / f64::from(matches) > 0.7 {
        return Some(Candidate {
            side: Outcome::Big,
            occurrences: matches,
            reason: Some(reason),
        });
    }
    if f64::from(small_vote) / f64::from(matches) > 0.7 {
        return Some(Candidate {
            side: Outcome::Small,
            occurrences: matches,
            reason: Some(reason),
        });
    }
    None
}

/// How a Symmetry motif matches the recent signature
#[derive(Debug, Clone, Copy)]
enum MotifRule {
    /// Prefix of the 6-char signature
    Prefix,
    /// Exact 6-char signature
    Exact6,
    /// Exact 8-char signature (needs 8 entries older than target)
    Exact8,
}

struct Motif {
    pattern: &'static str,
    rule: MotifRule,
    side: Outcome,
    occurrences: u32,
    reason: &'static str,
}

/// Named motif table, checked in this exact priority order. Earlier rows
/// shadow later ones: a 6-char signature starting "BBSS" resolves at the 2-2
/// row even when its full form would also match a mirrored row below.
const MOTIFS: &[Motif] = &[
    Motif { pattern: "SSSBBB", rule: MotifRule::Prefix, side: Outcome::Big, occurrences: 6, reason: "3-3 bridge (S-S-S-B-B-B)" },
    Motif { pattern: "BBBSSS", rule: MotifRule::Prefix, side: Outcome::Small, occurrences: 6, reason: "3-3 bridge (B-B-B-S-S-S)" },
    Motif { pattern: "SSSB", rule: MotifRule::Prefix, side: Outcome::Big, occurrences: 3, reason: "3-3 bridge forming (S-S-S-B...)" },
    Motif { pattern: "BBBS", rule: MotifRule::Prefix, side: Outcome::Small, occurrences: 3, reason: "3-3 bridge forming (B-B-B-S...)" },
    Motif { pattern: "SSBB", rule: MotifRule::Prefix, side: Outcome::Small, occurrences: 4, reason: "2-2 bridge (S-S-B-B)" },
    Motif { pattern: "BBSS", rule: MotifRule::Prefix, side: Outcome::Big, occurrences: 4, reason: "2-2 bridge (B-B-S-S)" },
    Motif { pattern: "SSB", rule: MotifRule::Prefix, side: Outcome::Big, occurrences: 2, reason: "2-2 bridge forming (S-S-B...)" },
    Motif { pattern: "BBS", rule: MotifRule::Prefix, side: Outcome::Small, occurrences: 2, reason: "2-2 bridge forming (B-B-S...)" },
    Motif { pattern: "SSSSBBBB", rule: MotifRule::Exact8, side: Outcome::Small, occurrences: 8, reason: "4-4 bridge (S-S-S-S-B-B-B-B)" },
    Motif { pattern: "BBBBSSSS", rule: MotifRule::Exact8, side: Outcome::Big, occurrences: 8, reason: "4-4 bridge (B-B-B-B-S-S-S-S)" },
    Motif { pattern: "BSBSBS", rule: MotifRule::Exact6, side: Outcome::Big, occurrences: 6, reason: "Riding 1-1 bridge (B-S-B-S-B-S)" },
    Motif { pattern: "SBSBSB", rule: MotifRule::Exact6, side: Outcome::Small, occurrences: 6, reason: "Riding 1-1 bridge (S-B-S-B-S-B)" },
    Motif { pattern: "BBSSBB", rule: MotifRule::Exact6, side: Outcome::Small, occurrences: 6, reason: "Mirrored B-B-S-S-B-B" },
    Motif { pattern: "SSBBSS", rule: MotifRule::Exact6, side: Outcome::Big, occurrences: 6, reason: "Mirrored S-S-B-B-S-S" },
];

/// Literal recognizer for named short motifs against the 6- and 8-char
/// signatures immediately older than target
fn symmetry(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 6 {
        return None;
    }
    let sig6 = signature_before(history, target, 6);
    let sig8 = if target < n - 8 {
        Some(signature_before(history, target, 8))
    } else {
        None
    };

    for motif in MOTIFS {
        let hit = match motif.rule {
            MotifRule::Prefix => sig6.starts_with(motif.pattern),
            MotifRule::Exact6 => sig6 == motif.pattern,
            MotifRule::Exact8 => sig8.as_deref() == Some(motif.pattern),
        };
        if hit {
            return Some(Candidate {
                side: motif.side,
                occurrences: motif.occurrences,
                reason: Some(motif.reason.to_string()),
            });
        }
    }
    None
}

/// Naive echo of the outcome two positions older than target
fn mirror(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 2 {
        return None;
    }
    Some(Candidate::bare(side_at(history, target + 2)))
}

/// Longest-exact-match lookup: tries signature lengths 24 down to 4 and
/// returns what followed the first (longest) historical repeat found
fn neural(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    for len in (4..=24usize).rev() {
        let len_i = len as isize;
        if target >= n - len_i - 1 {
            continue;
        }
        let sig: Vec<Outcome> = (1..=len_i).map(|k| side_at(history, target + k)).collect();
        let mut i = target + 2;
        while i < n - len_i {
            let mut matched = true;
            for (k, want) in sig.iter().enumerate() {
                if side_at(history, i + k as isize) != *want {
                    matched = false;
                    break;
                }
            }
            if matched {
                return Some(Candidate::bare(side_at(history, i - 1)));
            }
            i += 1;
        }
    }
    None
}

/// Autocorrelation over a 30-entry window: picks the period (1-12) with the
/// highest same-value correlation and follows it when correlation > 0.72
fn wave(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 20 {
        return None;
    }
    let mut wave = Vec::with_capacity(30);
    let mut i = target + 1;
    while i < target + 31 && i < n {
        wave.push(if side_at(history, i) == Outcome::Big { 1i8 } else { -1i8 });
        i += 1;
    }

    let mut best_period: isize = -1;
    let mut max_corr = -1.0f64;
    for period in 1..=12usize {
        let mut corr = 0u32;
        let mut count = 0u32;
        for j in 0..wave.len().saturating_sub(period) {
            if wave[j] == wave[j + period] {
                corr += 1;
            }
            count += 1;
        }
        if count > 0 && f64::from(corr) / f64::from(count) > max_corr {
            max_corr = f64::from(corr) / f64::from(count);
            best_period = period as isize;
        }
    }

    if max_corr > 0.72 && best_period > 0 {
        return Some(Candidate::bare(side_at(history, target + best_period)));
    }
    None
}

/// 9-char fuzzy matcher: historical windows agreeing on >= 7 of 9 positions
/// vote for what followed them, weighted by match strength
fn bayesian(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if n < 100 {
        return None;
    }
    if target + 9 > n - 1 {
        return None;
    }
    let seq: Vec<Outcome> = (1..=9isize).map(|k| side_at(history, target + k)).collect();

    let mut big = 0i64;
    let mut small = 0i64;
    let mut i = target + 11;
    while i < n - 9 {
        let mut agree = 0i64;
        for (k, want) in seq.iter().enumerate() {
            if side_at(history, i + k as isize) == *want {
                agree += 1;
            }
        }
        if agree >= 7 {
            if side_at(history, i - 1) == Outcome::Big {
                big += agree;
            } else {
                small += agree;
            }
        }
        i += 1;
    }

    if big == 0 && small == 0 {
        return None;
    }
    Some(Candidate::bare(if big > small { Outcome::Big } else { Outcome::Small }))
}

/// Exact 4-gram matcher: votes on what followed each historical repeat of
/// the most recent 4 outcomes; requires >= 2 matches
fn markov_order4(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 5 {
        return None;
    }
    let s: Vec<Outcome> = (1..=4isize).map(|k| side_at(history, target + k)).collect();

    let mut big = 0u32;
    let mut small = 0u32;
    let mut total = 0u32;
    let mut i = target + 2;
    while i < n - 5 {
        if side_at(history, i + 3) == s[3]
            && side_at(history, i + 2) == s[2]
            && side_at(history, i + 1) == s[1]
            && side_at(history, i) == s[0]
        {
            if side_at(history, i - 1) == Outcome::Big {
                big += 1;
            } else {
                small += 1;
            }
            total += 1;
        }
        i += 1;
    }

    if total < 2 {
        return None;
    }
    Some(Candidate::bare(if big > small { Outcome::Big } else { Outcome::Small }))
}

struct BridgePattern {
    seq: &'static str,
    next: char,
    name: &'static str,
}

/// Named bridge table for the break detector, checked in order
const BRIDGES: &[BridgePattern] = &[
    BridgePattern { seq: "BBS", next: 'B', name: "2-1 Big" },
    BridgePattern { seq: "SSB", next: 'S', name: "2-1 Small" },
    BridgePattern { seq: "BBSS", next: 'B', name: "2-2 Big" },
    BridgePattern { seq: "SSBB", next: 'S', name: "2-2 Small" },
    BridgePattern { seq: "BBBS", next: 'B', name: "3-1 Big" },
    BridgePattern { seq: "SSSB", next: 'S', name: "3-1 Small" },
    BridgePattern { seq: "BBBSS", next: 'B', name: "3-2 Big" },
    BridgePattern { seq: "SSSBB", next: 'S', name: "3-2 Small" },
    BridgePattern { seq: "BBBSSS", next: 'B', name: "3-3 Big" },
    BridgePattern { seq: "SSSBBB", next: 'S', name: "3-3 Small" },
    BridgePattern { seq: "BBBBS", next: 'B', name: "4-1 Big" },
    BridgePattern { seq: "SSSSB", next: 'S', name: "4-1 Small" },
    BridgePattern { seq: "BBBBSS", next: 'B', name: "4-2 Big" },
    BridgePattern { seq: "SSSSBB", next: 'S', name: "4-2 Small" },
    BridgePattern { seq: "BBBBSSS", next: 'B', name: "4-3 Big" },
    BridgePattern { seq: "SSSSBBB", next: 'S', name: "4-3 Small" },
    BridgePattern { seq: "BBBBSSSS", next: 'B', name: "4-4 Big" },
    BridgePattern { seq: "SSSSBBBB", next: 'S', name: "4-4 Small" },
    BridgePattern { seq: "BBBBBS", next: 'B', name: "5-1 Big" },
    BridgePattern { seq: "SSSSSBB", next: 'S', name: "5-1 Small" },
];

/// Matches the immediately-older window against the bridge table, then
/// backtests whether that bridge historically broke more often than it
/// followed; predicts the reversal when breaks dominate (> 2 and > follows)
fn bridge_break(history: &[HistoryEntry], target: isize) -> Option<Candidate> {
    let n = history.len() as isize;
    if target >= n - 10 {
        return None;
    }

    for pattern in BRIDGES {
        let len = pattern.seq.len();
        if signature_before(history, target, len) != pattern.seq {
            continue;
        }

        let mut follows = 0u32;
        let mut breaks = 0u32;
        let search_limit = (n - len as isize - 1).min(1000);
        let mut i = target + 1;
        while i < search_limit {
            if signature_before(history, i, len) == pattern.seq {
                if side_at(history, i).code() == pattern.next {
                    follows += 1;
                } else {
                    breaks += 1;
                }
            }
            i += 1;
        }

        let follow_side = if pattern.next == 'B' { Outcome::Big } else { Outcome::Small };
        if breaks > follows && breaks > 2 {
            return Some(Candidate {
                side: follow_side.flip(),
                occurrences: follows + breaks,
                reason: Some(format!("Bridge {} broke", pattern.name)),
            });
        }
        return Some(Candidate {
            side: follow_side,
            occurrences: follows + breaks,
            reason: Some(format!("Following bridge {}", pattern.name)),
        });
    }
    None
}
