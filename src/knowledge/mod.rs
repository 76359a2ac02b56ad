//! Fixed campus facts handed to the reasoning step as background, plus the one
//! literal message that is answered verbatim without any reasoning.

mod fares;
mod timetable;

pub use fares::{BAU_FARES, FareRoute, FareTable, Vehicle};
pub use timetable::{BAU_TIMETABLE, BusTimetable, DayCategory, DepartureGroup, Direction};

pub const OVERRIDE_TRIGGER: &str = "O, tell me of that curious crew, The threesome perched with quite the view, On \"top\" of the dean - they make their scene, The rooftop's quirkiest ever team!";

pub const OVERRIDE_REPLY: &str = "Look at them, this treesome of dickheads, sticking together like they're afraid their last brain cell will wander off alone. They stumble through life, a walking disaster, and anyone who gets in their way ends up bruised. Their little club of cluelessness is nothing but trouble, a storm of stupid leaving everyone else to clean up the mess. Honestly, they're like a walking, talking argument for natural selection taking a coffee break. You just watch them coming and brace yourself for the fallout.";

// Generic words such as "hall" or "auto" only count inside a known place name.
const CAMPUS_KEYWORDS: [&str; 9] = [
    "bau", "campus", "bus", "buses", "fare", "fares", "rickshaw", "rickshaws", "stopage",
];

const CAMPUS_PHRASES: [&str; 4] = [
    "agricultural university",
    "jabbar er mor",
    "town hall mor",
    "transportation dept",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LiteralOverride {
    trigger: &'static str,
    reply: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeContext {
    pub timetable: BusTimetable,
    pub fares: FareTable,
    literal: LiteralOverride,
}

impl Default for KnowledgeContext {
    fn default() -> Self {
        Self::bau()
    }
}

impl KnowledgeContext {
    pub const fn bau() -> Self {
        Self {
            timetable: BAU_TIMETABLE,
            fares: FareTable::new(BAU_FARES),
            literal: LiteralOverride {
                trigger: OVERRIDE_TRIGGER,
                reply: OVERRIDE_REPLY,
            },
        }
    }

    /// Byte-for-byte match only; whitespace or case differences do not trigger.
    pub fn literal_override(&self, message: &str) -> Option<&'static str> {
        (message == self.literal.trigger).then_some(self.literal.reply)
    }

    pub fn is_campus_related(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        let has_keyword = lowered
            .split(|ch: char| !ch.is_alphanumeric())
            .any(|word| CAMPUS_KEYWORDS.contains(&word));
        if has_keyword {
            return true;
        }

        CAMPUS_PHRASES.iter().any(|phrase| lowered.contains(phrase))
            || self
                .fares
                .places()
                .iter()
                .any(|place| lowered.contains(&place.to_lowercase()))
    }

    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.timetable.render(), self.fares.render())
    }
}
