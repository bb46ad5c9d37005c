/// Progress report generation
///
/// Builds a paginated report from a session summary. Layout is kept apart
/// from rendering so another renderer (PDF, HTML) can be slotted in behind
/// `ReportRenderer`.

use crate::models::{PatientInfo, ProgressReport, RenderedReport, ReportPage, SessionSummary};
use crate::services::threshold_table::ideal_range_for;
use chrono::Utc;

/// Rep log rows per page
pub const DEFAULT_ROWS_PER_PAGE: usize = 20;

/// Scores under this are flagged in the form analysis
pub const LOW_SCORE_THRESHOLD: f64 = 60.0;

const REPORT_TITLE: &str = "Physiotherapy Progress Report";

/// Turns a laid-out report into a document
pub trait ReportRenderer: Send + Sync {
    fn media_type(&self) -> &'static str;

    fn render(&self, report: &ProgressReport) -> String;
}

/// Fixed-width text renderer; pages are separated by form feeds
#[derive(Debug, Clone)]
pub struct PlainTextRenderer {
    width: usize,
}

impl PlainTextRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(40),
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new(72)
    }
}

impl ReportRenderer for PlainTextRenderer {
    fn media_type(&self) -> &'static str {
        "text/plain"
    }

    fn render(&self, report: &ProgressReport) -> String {
        let width = self.width;
        let total = report.pages.len();

        report
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let mut out = String::new();
                out.push_str(&format!("{:^width$}\n", report.title, width = width));
                out.push_str(&format!("{}\n", "=".repeat(width)));
                out.push_str(&format!("{}\n", page.title));
                out.push_str(&format!("{}\n", "-".repeat(width)));
                for line in &page.lines {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
                out.push_str(&format!(
                    "{:>width$}\n",
                    format!("Page {} of {}", index + 1, total),
                    width = width
                ));
                out
            })
            .collect::<Vec<_>>()
            .join("\x0c")
    }
}

/// Report service
pub struct ReportService {
    renderer: Box<dyn ReportRenderer>,
    rows_per_page: usize,
}

impl ReportService {
    pub fn new() -> Self {
        Self::with_renderer(Box::new(PlainTextRenderer::default()))
    }

    pub fn with_renderer(renderer: Box<dyn ReportRenderer>) -> Self {
        Self {
            renderer,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }

    pub fn with_rows_per_page(mut self, rows: usize) -> Self {
        self.rows_per_page = rows.max(1);
        self
    }

    /// Lay out the report pages
    pub fn build(&self, summary: &SessionSummary, patient: &PatientInfo) -> ProgressReport {
        let mut pages = vec![self.summary_page(summary, patient)];
        pages.extend(self.rep_log_pages(summary));
        pages.push(self.form_analysis_page(summary));

        ProgressReport {
            title: REPORT_TITLE.to_string(),
            patient: patient.clone(),
            generated_at: Utc::now(),
            pages,
        }
    }

    pub fn render(&self, report: &ProgressReport) -> RenderedReport {
        RenderedReport {
            media_type: self.renderer.media_type().to_string(),
            page_count: report.page_count(),
            generated_at: report.generated_at,
            content: self.renderer.render(report),
        }
    }

    /// Build and render in one step
    pub fn generate(&self, summary: &SessionSummary, patient: &PatientInfo) -> RenderedReport {
        let report = self.build(summary, patient);
        tracing::info!(
            patient_id = %patient.patient_id,
            pages = report.page_count(),
            "Generated progress report"
        );
        self.render(&report)
    }

    fn summary_page(&self, summary: &SessionSummary, patient: &PatientInfo) -> ReportPage {
        let mut page = ReportPage::new("Session Summary");
        page.push(format!("Patient: {}", patient.patient_name));
        page.push(format!("Patient ID: {}", patient.patient_id));
        page.push(format!("Exercise: {}", summary.exercise.display_name()));

        match summary.assigned_reps {
            Some(assigned) if assigned > 0 => {
                let completion = 100.0 * summary.reps as f64 / assigned as f64;
                page.push(format!(
                    "Reps: {} of {} assigned ({:.0}% complete)",
                    summary.reps, assigned, completion
                ));
            }
            _ => page.push(format!("Reps: {}", summary.reps)),
        }

        page.push(format!("Sets: {}", summary.sets));
        if summary.reps_per_set.len() > 1 {
            let per_set: Vec<String> = summary
                .reps_per_set
                .iter()
                .enumerate()
                .map(|(i, reps)| format!("set {}: {}", i + 1, reps))
                .collect();
            page.push(format!("Reps per set: {}", per_set.join(", ")));
        }
        page.push(format!("Duration: {:.1} sec", summary.duration));
        page.push(format!("Avg Time / Rep: {:.2} sec", summary.avg_time));
        page.push(format!("Form Score: {:.1}%", summary.form_score));
        page
    }

    fn rep_log_pages(&self, summary: &SessionSummary) -> Vec<ReportPage> {
        if summary.rep_log.is_empty() {
            let mut page = ReportPage::new("Repetition Log");
            page.push("No repetitions recorded.");
            return vec![page];
        }

        let first_ms = summary.rep_log[0].timestamp_ms;
        let chunks: Vec<_> = summary.rep_log.chunks(self.rows_per_page).collect();
        let total = chunks.len();

        chunks
            .into_iter()
            .enumerate()
            .map(|(index, reps)| {
                let title = if total > 1 {
                    format!("Repetition Log ({}/{})", index + 1, total)
                } else {
                    "Repetition Log".to_string()
                };
                let mut page = ReportPage::new(title);
                page.push(format!(
                    "{:>4}  {:>4}  {:>9}  {:>10}  {:>6}",
                    "Set", "Rep", "Time (s)", "Peak (deg)", "Score"
                ));
                for rep in reps {
                    page.push(format!(
                        "{:>4}  {:>4}  {:>9.2}  {:>10.1}  {:>6.1}",
                        rep.set,
                        rep.index,
                        rep.timestamp_ms.saturating_sub(first_ms) as f64 / 1000.0,
                        rep.peak_angle,
                        rep.score
                    ));
                }
                page
            })
            .collect()
    }

    fn form_analysis_page(&self, summary: &SessionSummary) -> ReportPage {
        let range = ideal_range_for(&summary.exercise);
        let mut page = ReportPage::new("Form Analysis");
        page.push(format!(
            "Ideal peak range: {:.0}-{:.0} deg",
            range.min, range.max
        ));

        let by_score = |a: &&crate::models::RepRecord, b: &&crate::models::RepRecord| {
            a.score.total_cmp(&b.score)
        };
        if let (Some(best), Some(worst)) = (
            summary.rep_log.iter().max_by(by_score),
            summary.rep_log.iter().min_by(by_score),
        ) {
            page.push(format!(
                "Best rep: #{} ({:.1} deg, score {:.1})",
                best.index, best.peak_angle, best.score
            ));
            page.push(format!(
                "Weakest rep: #{} ({:.1} deg, score {:.1})",
                worst.index, worst.peak_angle, worst.score
            ));
        }

        let low: Vec<String> = summary
            .rep_log
            .iter()
            .filter(|rep| rep.score < LOW_SCORE_THRESHOLD)
            .map(|rep| format!("#{}", rep.index))
            .collect();
        if low.is_empty() {
            page.push(format!("Reps scoring under {:.0}: none", LOW_SCORE_THRESHOLD));
        } else {
            page.push(format!(
                "Reps scoring under {:.0}: {}",
                LOW_SCORE_THRESHOLD,
                low.join(", ")
            ));
        }

        page.push(String::new());
        page.push(coaching_note(summary));
        page
    }
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}

fn coaching_note(summary: &SessionSummary) -> String {
    if summary.rep_log.is_empty() {
        "Note: no completed repetitions were detected. Check camera framing and lighting.".to_string()
    } else if summary.form_score >= 85.0 {
        "Note: excellent form. Keep the same range of motion.".to_string()
    } else if summary.form_score >= LOW_SCORE_THRESHOLD {
        "Note: good form overall. Aim for the ideal range on every rep.".to_string()
    } else {
        "Note: range of motion is often outside the ideal range. Slow down and focus on control."
            .to_string()
    }
}
