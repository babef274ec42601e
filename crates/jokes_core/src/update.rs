use crate::{classify, Classification, Effect, JokeViewMapper, Msg, ScreenState, SearchCycle};

/// Pure update function: applies a message to a search cycle and returns the effects to run.
///
/// Once a terminal message has been applied the cycle ignores everything else.
pub fn update(mut cycle: SearchCycle, msg: Msg) -> (SearchCycle, Vec<Effect>) {
    if cycle.is_finished() {
        return (cycle, Vec::new());
    }

    let effects = match msg {
        Msg::Started => {
            if cycle.show_progress() {
                vec![Effect::ShowProgress]
            } else {
                Vec::new()
            }
        }
        Msg::PageReceived(page) => {
            cycle.prepend_page(page);
            if cycle.is_empty() {
                vec![Effect::Publish(ScreenState::Empty)]
            } else {
                let mut effects = Vec::with_capacity(2);
                if cycle.hide_progress() {
                    effects.push(Effect::HideProgress);
                }
                effects.push(Effect::Publish(ScreenState::Result(
                    JokeViewMapper::to_views(cycle.jokes()),
                )));
                effects
            }
        }
        Msg::Failed(error) => {
            // Once something has been shown a later failure must not replace it.
            let mut effects = Vec::with_capacity(2);
            if cycle.is_empty() {
                effects.push(match classify(&error.kind) {
                    Classification::Network => Effect::Publish(ScreenState::NetworkError),
                    Classification::Http => Effect::Publish(ScreenState::HttpError),
                    Classification::Unhandled => Effect::Escalate(error),
                });
            }
            finish(&mut cycle, effects)
        }
        Msg::Completed | Msg::Cancelled => finish(&mut cycle, Vec::new()),
    };

    (cycle, effects)
}

fn finish(cycle: &mut SearchCycle, mut effects: Vec<Effect>) -> Vec<Effect> {
    cycle.finish();
    if cycle.hide_progress() {
        effects.push(Effect::HideProgress);
    }
    effects
}
