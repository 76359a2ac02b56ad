use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayCategory {
    /// Bus service does not run.
    Friday,
    Saturday,
    /// Every day other than Friday and Saturday.
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    CampusToTown,
    TownToCampus,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::CampusToTown => "Leaves BAU for the mymensingh town",
            Self::TownToCampus => "Leaves town for BAU",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTimetable {
    pub campus_stop: &'static str,
    pub town_stop: &'static str,
    saturday_to_town: &'static [&'static str],
    saturday_to_campus: &'static [&'static str],
    regular_to_town: &'static [&'static str],
    regular_to_campus: &'static [&'static str],
}

/// A departure time together with the number of buses leaving at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepartureGroup {
    pub time: &'static str,
    pub buses: usize,
}

// Repeated times denote simultaneous buses; the list is reproduced as published.
pub const BAU_TIMETABLE: BusTimetable = BusTimetable {
    campus_stop: "Jabbar er Mor",
    town_stop: "Town Hall Mor",
    saturday_to_town: &["2:10 pm"],
    saturday_to_campus: &["3:00 pm"],
    regular_to_town: &[
        "7:05 am", "8:05 am", "8:05 am", "11:30 am", "12:30 pm", "1:15 pm", "2:35 pm", "4:10 pm",
        "4:10 pm", "5:05 pm", "8:10 pm",
    ],
    regular_to_campus: &[
        "7:30 pm", "8:25 pm", "8:25 pm", "12:00 pm", "1:05 pm", "1:45 pm", "3:00 pm", "4:40 pm",
        "4:40 pm", "6:15 pm", "8:30 pm",
    ],
};

impl BusTimetable {
    pub fn departures(&self, day: DayCategory, direction: Direction) -> &'static [&'static str] {
        match (day, direction) {
            (DayCategory::Friday, _) => &[],
            (DayCategory::Saturday, Direction::CampusToTown) => self.saturday_to_town,
            (DayCategory::Saturday, Direction::TownToCampus) => self.saturday_to_campus,
            (DayCategory::Regular, Direction::CampusToTown) => self.regular_to_town,
            (DayCategory::Regular, Direction::TownToCampus) => self.regular_to_campus,
        }
    }

    /// Collapses repeated times into one group per time, keeping listing order.
    pub fn departure_groups(&self, day: DayCategory, direction: Direction) -> Vec<DepartureGroup> {
        let mut groups: Vec<DepartureGroup> = Vec::new();
        for time in self.departures(day, direction) {
            match groups.iter_mut().find(|group| group.time == *time) {
                Some(group) => group.buses += 1,
                None => groups.push(DepartureGroup { time, buses: 1 }),
            }
        }
        groups
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Bus Schedule\n\n");
        let _ = writeln!(
            out,
            "The following is the regular daily bus schedule of the transportation dept of \
             Bangladesh Agricultural University. The times listed indicate when the buses depart. \
             If a time is repeated multiple times, it means that the corresponding number of buses \
             will depart simultaneously at that time. The stopage for BAU is the {}, and the \
             stopage for the Town is the {}.",
            self.campus_stop, self.town_stop
        );
        out.push_str("\nBus service is closed on fridays\n");

        for (heading, day) in [
            ("Only for saturdays:", DayCategory::Saturday),
            ("For the other days of the week:", DayCategory::Regular),
        ] {
            let _ = writeln!(out, "\n{heading}");
            for direction in [Direction::CampusToTown, Direction::TownToCampus] {
                let _ = write!(
                    out,
                    "\t{} - {}",
                    direction.label(),
                    self.departures(day, direction).join(", ")
                );
                let simultaneous: Vec<String> = self
                    .departure_groups(day, direction)
                    .into_iter()
                    .filter(|group| group.buses > 1)
                    .map(|group| format!("{} buses at {}", group.buses, group.time))
                    .collect();
                if !simultaneous.is_empty() {
                    let _ = write!(out, " ({})", simultaneous.join(", "));
                }
                out.push('\n');
            }
        }
        out
    }
}
