use crate::report::CompanyReport;

/// The four screens of the report front-end. Exactly one fetch can be in
/// flight: the submit affordance only exists on `Search`, so a second
/// submission while `Loading` is impossible through the surface.
#[derive(Debug, Clone)]
pub enum Screen {
    Search,
    Loading { company: String },
    Error { message: String },
    Dashboard { report: Box<CompanyReport> },
}

#[derive(Debug, Clone)]
pub enum Event {
    Submit { company: String },
    Settled { result: Result<Box<CompanyReport>, String> },
    Back,
}

impl Screen {
    /// Total transition function: every (screen, event) pair yields a next
    /// screen, and events that make no sense for the current screen leave
    /// it unchanged. No side effects beyond the returned state; the
    /// previous report is dropped, not reused, when a new search begins.
    pub fn apply(self, event: Event) -> Screen {
        match (self, event) {
            (Screen::Search, Event::Submit { company }) => {
                let company = company.trim().to_string();
                if company.is_empty() {
                    Screen::Search
                } else {
                    Screen::Loading { company }
                }
            }
            (Screen::Loading { .. }, Event::Settled { result }) => match result {
                Ok(report) => Screen::Dashboard { report },
                Err(message) => Screen::Error { message },
            },
            (Screen::Error { .. }, Event::Back) => Screen::Search,
            (Screen::Dashboard { .. }, Event::Back) => Screen::Search,
            (screen, _) => screen,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Screen::Loading { .. })
    }
}
