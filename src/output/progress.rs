use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{emphasis, heading, notice, ok};

/// Progress tracking for multi-phase operations
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    pub fn start_phase_1() -> Self {
        eprintln!("{}  {}", emphasis("⚙️"), heading("Phases"));
        let pb = create_spinner(notice("Phase 1/3: Listing Jenkins jobs"));
        Self { pb }
    }

    pub fn finish_phase_1_start_phase_2(self) -> Self {
        self.pb
            .finish_with_message(ok("Phase 1/3: Listed Jenkins jobs ✓"));
        let pb = create_spinner(notice("Phase 2/3: Fetching job configs"));
        Self { pb }
    }

    pub fn finish_phase_2_start_phase_3(self) -> Self {
        self.pb
            .finish_with_message(ok("Phase 2/3: Fetched job configs ✓"));
        let pb = create_spinner(notice("Phase 3/3: Scanning and cross-referencing"));
        Self { pb }
    }

    pub fn finish_phase_3(self) {
        self.pb
            .finish_with_message(ok("Phase 3/3: Scan complete ✓"));
        eprintln!("\n");
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
