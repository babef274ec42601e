use jokes_engine::{JokeView, ProgressSignal, ScreenState, TextSize};

pub fn render_progress(signal: ProgressSignal) -> &'static str {
    match signal {
        ProgressSignal::Show => "Loading…",
        ProgressSignal::Hide => "",
    }
}

pub fn render(state: &ScreenState) -> Vec<String> {
    match state {
        ScreenState::Empty => vec!["No jokes found.".to_string()],
        ScreenState::NetworkError => {
            vec!["Could not reach the joke server. Check your connection.".to_string()]
        }
        ScreenState::HttpError => vec!["The joke server returned an error.".to_string()],
        ScreenState::Result(views) => {
            let mut lines = Vec::with_capacity(views.len() + 1);
            lines.push(format!("{} jokes:", views.len()));
            lines.extend(views.iter().map(render_joke));
            lines
        }
    }
}

fn render_joke(view: &JokeView) -> String {
    match view.text_size {
        TextSize::Large => format!("[{}] {}", view.category, view.text.to_uppercase()),
        TextSize::Small => format!("[{}] {}", view.category, view.text),
    }
}
