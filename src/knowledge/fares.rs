use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vehicle {
    /// Shared public electric vehicle.
    Auto,
    /// Reserved electric or manually pulled rickshaw.
    Rickshaw,
}

/// Fares in BDT from any of `origins` to any of `destinations`. A `None` fare
/// means the vehicle does not serve the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareRoute {
    pub origins: &'static [&'static str],
    pub destinations: &'static [&'static str],
    pub auto: Option<u32>,
    pub rickshaw: Option<u32>,
}

impl FareRoute {
    pub fn fare(&self, vehicle: Vehicle) -> Option<u32> {
        match vehicle {
            Vehicle::Auto => self.auto,
            Vehicle::Rickshaw => self.rickshaw,
        }
    }

    #[cfg(test)]
    fn serves(&self, origin: &str, destination: &str) -> bool {
        self.origins.iter().any(|place| same_place(place, origin))
            && self
                .destinations
                .iter()
                .any(|place| same_place(place, destination))
    }

    fn fare_summary(&self) -> String {
        [(Vehicle::Auto, "Auto"), (Vehicle::Rickshaw, "Rickshaw")]
            .into_iter()
            .filter_map(|(vehicle, label)| {
                self.fare(vehicle)
                    .map(|fare| format!("{label} fare: {fare} BDT"))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

const KR_MARKET: &[&str] = &["KR Market"];
const KARIM_BHABAN: &[&str] = &["Karim Bhaban"];
const JABBARER_MOR: &[&str] = &["Jabbarer Mor"];
const TSC_ADMIN: &[&str] = &["TSC", "Administrative Building"];
const NORTH_HALLS: &[&str] = &[
    "Fajlul Haque Hall",
    "Hossain Shahid Suhrawardi Hall",
    "Bangabandhu Sheikh Mujib Hall",
];

pub const BAU_FARES: &[FareRoute] = &[
    FareRoute {
        origins: KR_MARKET,
        destinations: &[
            "Administrative Building",
            "TSC",
            "Health Care Center",
            "Karim Bhaban",
            "Isha Kha Hall",
            "Shahid Jamal Hossain Hall",
            "Shesh Mor",
            "Shahid Najmul Ahsan Hall",
            "Ashraful Haque Hall",
            "Shahid Shamsul Haque Hall",
            "Agricultural Extension Building",
        ],
        auto: Some(5),
        rickshaw: Some(10),
    },
    FareRoute {
        origins: KR_MARKET,
        destinations: &["Shahjalal Hall"],
        auto: None,
        rickshaw: Some(15),
    },
    FareRoute {
        origins: KR_MARKET,
        destinations: NORTH_HALLS,
        auto: None,
        rickshaw: Some(20),
    },
    FareRoute {
        origins: KARIM_BHABAN,
        destinations: &[
            "Shahid Jamal Hossain Hall",
            "Shahjalal Hall",
            "Shahid Shamsul Haque Hall",
            "Ashraful Haque Hall",
            "Shahid Najmul Ahsan Hall",
        ],
        auto: None,
        rickshaw: Some(10),
    },
    FareRoute {
        origins: KARIM_BHABAN,
        destinations: NORTH_HALLS,
        auto: None,
        rickshaw: Some(20),
    },
    FareRoute {
        origins: JABBARER_MOR,
        destinations: &[
            "Fajlul Haque Hall",
            "Hossain Shahid Suhrawardi Hall",
            "Bangabandhu Sheikh Mujib Hall",
            "Administrative Building",
            "TSC",
            "Sultana Razia Hall",
            "Tapashi Rabeya Hall",
            "July 36 hall",
            "Krishikonna Hall",
            "Begum Rokeya Hall",
            "KR Market",
            "Karim Bhaban",
            "Shahid Najmul Ahsan Hall",
            "Shahid Shamsul Haque Hall",
            "Shahjalal Hall",
            "Ashraful Haque Hall",
        ],
        auto: Some(5),
        rickshaw: Some(10),
    },
    FareRoute {
        origins: JABBARER_MOR,
        destinations: &["Isha Kha Hall", "Shahid Jamal Hossain Hall", "Shesh Mor"],
        auto: None,
        rickshaw: Some(15),
    },
    FareRoute {
        origins: JABBARER_MOR,
        destinations: &["Agronomy Field/Farm", "Horticulture farm"],
        auto: None,
        rickshaw: Some(15),
    },
    FareRoute {
        origins: JABBARER_MOR,
        destinations: &["Dairy farm", "Poultry farm"],
        auto: None,
        rickshaw: Some(20),
    },
    FareRoute {
        origins: TSC_ADMIN,
        destinations: &[
            "Karim Bhaban",
            "Fajlul Haque Hall",
            "Hossain Shahid Suhrawardi Hall",
            "Bangabandhu Sheikh Mujib Hall",
        ],
        auto: None,
        rickshaw: Some(10),
    },
    FareRoute {
        origins: TSC_ADMIN,
        destinations: &["Shesh Mor"],
        auto: Some(5),
        rickshaw: Some(15),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareTable {
    routes: &'static [FareRoute],
}

impl FareTable {
    pub const fn new(routes: &'static [FareRoute]) -> Self {
        Self { routes }
    }

    /// Routes listed from `origin` to `destination`. Place names match
    /// case-insensitively; no reverse-direction lookup is attempted.
    #[cfg(test)]
    pub fn fares_between(&self, origin: &str, destination: &str) -> Vec<&'static FareRoute> {
        self.routes
            .iter()
            .filter(|route| route.serves(origin, destination))
            .collect()
    }

    /// Every distinct place name appearing in the table.
    pub fn places(&self) -> Vec<&'static str> {
        let mut places: Vec<&'static str> = Vec::new();
        for route in self.routes {
            for place in route.origins.iter().chain(route.destinations) {
                if !places.iter().any(|known| same_place(known, place)) {
                    places.push(*place);
                }
            }
        }
        places
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Vehicle fare list\n\n");
        out.push_str(
            "The following is the regular fare list for vehicles in the campus of Bangladesh \
             Agricultural University. In this list, 'Auto' refers to shared public electric \
             vehicles, while 'Rickshaw' refers exclusively to reserved electric or manually pulled \
             rickshaws. In most cases, both auto and rickshaw fares are provided. If one is \
             missing, it indicates that the particular type of vehicle is not available on that \
             route. Please note that fares may vary due to natural disruptions. Passengers are \
             advised to confirm the fare before boarding any vehicle.\n",
        );

        let mut previous_origins: Option<&[&str]> = None;
        for route in self.routes {
            let line = format!(
                "To {} - {}",
                route.destinations.join(", "),
                route.fare_summary()
            );
            if previous_origins == Some(route.origins) {
                let _ = writeln!(out, "\t\t- {line}");
            } else {
                let _ = write!(out, "\nFrom {} - {line}\n", route.origins.join(", "));
            }
            previous_origins = Some(route.origins);
        }
        out
    }
}

fn same_place(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
