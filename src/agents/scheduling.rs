//! Service appointment booking

use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::info;

use super::traits::ServiceScheduler;
use super::types::Urgency;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCenter {
    pub id: String,
    pub name: String,
    pub capacity: u32,
}

impl ServiceCenter {
    fn new(id: &str, name: &str, capacity: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingPriority {
    Emergency,
    #[serde(rename = "High Priority")]
    HighPriority,
    Standard,
    Routine,
}

impl BookingPriority {
    /// Priority and lead time in days
    fn for_urgency(urgency: Urgency) -> (Self, i64) {
        match urgency {
            Urgency::Critical => (BookingPriority::Emergency, 1),
            Urgency::High => (BookingPriority::HighPriority, 2),
            Urgency::Medium => (BookingPriority::Standard, 7),
            Urgency::Low => (BookingPriority::Routine, 14),
        }
    }
}

impl std::fmt::Display for BookingPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingPriority::Emergency => write!(f, "Emergency"),
            BookingPriority::HighPriority => write!(f, "High Priority"),
            BookingPriority::Standard => write!(f, "Standard"),
            BookingPriority::Routine => write!(f, "Routine"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub vehicle_id: String,
    pub service_center: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub priority: BookingPriority,
    pub estimated_duration: String,
    pub status: String,
}

const TIME_SLOTS: [&str; 4] = ["09:00 AM", "11:00 AM", "02:00 PM", "04:00 PM"];

pub struct SchedulingAgent {
    centers: Vec<ServiceCenter>,
    rng: Mutex<StdRng>,
}

impl SchedulingAgent {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            centers: vec![
                ServiceCenter::new("SC001", "Downtown Service Center", 8),
                ServiceCenter::new("SC002", "North Side Auto Care", 6),
                ServiceCenter::new("SC003", "Express Service Hub", 10),
            ],
            rng: Mutex::new(rng),
        }
    }

    pub fn centers(&self) -> &[ServiceCenter] {
        &self.centers
    }
}

impl ServiceScheduler for SchedulingAgent {
    fn book_service(&self, vehicle_id: &str, urgency: Urgency) -> Booking {
        let (priority, days_ahead) = BookingPriority::for_urgency(urgency);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        // Emergencies always go to the primary center
        let center = if urgency == Urgency::Critical {
            self.centers.first()
        } else {
            self.centers.choose(&mut *rng)
        };
        let service_center = center
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Unassigned".to_string());
        let appointment_time = TIME_SLOTS
            .choose(&mut *rng)
            .copied()
            .unwrap_or(TIME_SLOTS[0])
            .to_string();
        let booking_id = format!("BK{}", rng.gen_range(1000..=9999));

        let booking = Booking {
            booking_id,
            vehicle_id: vehicle_id.to_string(),
            service_center,
            appointment_date: Local::now().date_naive() + Duration::days(days_ahead),
            appointment_time,
            priority,
            estimated_duration: "2 hours".to_string(),
            status: "Confirmed".to_string(),
        };
        info!(
            vehicle_id,
            booking_id = %booking.booking_id,
            priority = %booking.priority,
            date = %booking.appointment_date,
            "service booked"
        );
        booking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_goes_to_downtown_next_day() {
        let agent = SchedulingAgent::new(Some(3));
        let booking = agent.book_service("V001", Urgency::Critical);
        assert_eq!(booking.service_center, "Downtown Service Center");
        assert_eq!(booking.priority, BookingPriority::Emergency);
        assert_eq!(
            booking.appointment_date,
            Local::now().date_naive() + Duration::days(1)
        );
        assert_eq!(booking.status, "Confirmed");
    }

    #[test]
    fn test_lead_times() {
        let agent = SchedulingAgent::new(Some(3));
        let today = Local::now().date_naive();
        for (urgency, days, priority) in [
            (Urgency::High, 2, BookingPriority::HighPriority),
            (Urgency::Medium, 7, BookingPriority::Standard),
            (Urgency::Low, 14, BookingPriority::Routine),
        ] {
            let booking = agent.book_service("V002", urgency);
            assert_eq!(booking.appointment_date, today + Duration::days(days));
            assert_eq!(booking.priority, priority);
            assert!(agent
                .centers()
                .iter()
                .any(|c| c.name == booking.service_center));
        }
    }

    #[test]
    fn test_booking_id_format() {
        let agent = SchedulingAgent::new(None);
        let booking = agent.book_service("V003", Urgency::Low);
        assert!(booking.booking_id.starts_with("BK"));
        let n: u32 = booking.booking_id[2..].parse().unwrap();
        assert!((1000..=9999).contains(&n));
        assert!(TIME_SLOTS.contains(&booking.appointment_time.as_str()));
    }

    #[test]
    fn test_priority_serializes_as_label() {
        let json = serde_json::to_value(BookingPriority::HighPriority).unwrap();
        assert_eq!(json, "High Priority");
    }
}
