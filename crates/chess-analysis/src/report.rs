//! Plain-text game review.

use crate::analyzer::{AnalysisEntry, GameAnalysis};
use chess_rules::numbered;

/// Principal variations are cut to this many moves in the report.
pub const REPORT_PV_MOVES: usize = 6;

/// Render `analysis` as report lines: a summary block, `---`, then one line per ply.
pub fn format_report(analysis: &GameAnalysis) -> Vec<String> {
    let s = &analysis.summary;
    let mut lines = vec![
        format!(
            "Accuracy: White {:.2}% | Black {:.2}%",
            s.white_accuracy, s.black_accuracy
        ),
        format!(
            "Blunders: {}, Mistakes: {}, Inaccuracies: {}",
            s.blunders, s.mistakes, s.inaccuracies
        ),
        format!(
            "Avg loss: {:.2} pawns | Max loss: {:.2} pawns",
            s.avg_loss, s.max_loss
        ),
        "---".to_string(),
    ];

    if analysis.entries.is_empty() {
        lines.push("No moves to analyze.".to_string());
    }
    lines.extend(analysis.entries.iter().map(format_entry));
    lines
}

/// One report line, e.g. `12... Qxd4 → Blunder (loss 7.20) | Best: c6d4 | Line: c6d4 f3d4`.
pub fn format_entry(entry: &AnalysisEntry) -> String {
    let mut line = format!("{} → {}", numbered(entry.ply, &entry.san), entry.quality);
    if !entry.severity.is_mate() {
        line.push_str(&format!(" (loss {:.2})", entry.loss));
    }
    line.push_str(" | Best: ");
    line.push_str(entry.best_move.as_deref().unwrap_or("n/a"));
    if !entry.pv.is_empty() {
        let shown = &entry.pv[..entry.pv.len().min(REPORT_PV_MOVES)];
        line.push_str(" | Line: ");
        line.push_str(&shown.join(" "));
    }
    line
}
