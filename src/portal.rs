//! In-memory portal record the confirmation effects act on.
//!
//! Seeded with a fixed demo data set; nothing here is persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    pub kind: String,
    /// SAR
    pub amount: u32,
    pub date: String,
    pub location: String,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassportRecord {
    pub number: String,
    pub expiry: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub time: String,
    pub read: bool,
}

/// Renewal submitted through the confirmation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalRequest {
    pub city: String,
    pub duration_years: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalRecord {
    pub violations: Vec<Violation>,
    pub passport: PassportRecord,
    pub appointments: Vec<String>,
    pub notifications: Vec<Notification>,
    pub renewals: Vec<RenewalRequest>,
}

impl PortalRecord {
    /// Fresh copy of the demo data set.
    pub fn demo() -> Self {
        Self {
            violations: vec![
                Violation {
                    id: "V-99283".to_string(),
                    kind: "Speeding (10-20 km/h over)".to_string(),
                    amount: 150,
                    date: "2023-10-15".to_string(),
                    location: "Riyadh - Ring Road".to_string(),
                    paid: false,
                },
                Violation {
                    id: "V-11202".to_string(),
                    kind: "Illegal Parking".to_string(),
                    amount: 100,
                    date: "2023-11-01".to_string(),
                    location: "Jeddah - Corniche".to_string(),
                    paid: false,
                },
            ],
            passport: PassportRecord {
                number: "P12345678".to_string(),
                expiry: "2024-02-20".to_string(),
                status: "Active".to_string(),
            },
            appointments: Vec::new(),
            notifications: vec![
                Notification {
                    id: 1,
                    title: "Passport Expiry Warning".to_string(),
                    time: "2 hours ago".to_string(),
                    read: false,
                },
                Notification {
                    id: 2,
                    title: "New Traffic Violation Recorded".to_string(),
                    time: "1 day ago".to_string(),
                    read: true,
                },
                Notification {
                    id: 3,
                    title: "National Address Updated".to_string(),
                    time: "5 days ago".to_string(),
                    read: true,
                },
            ],
            renewals: Vec::new(),
        }
    }

    pub fn unpaid_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.paid)
    }

    pub fn has_unpaid_violations(&self) -> bool {
        self.unpaid_violations().next().is_some()
    }

    pub fn unpaid_total(&self) -> u32 {
        self.unpaid_violations().map(|v| v.amount).sum()
    }

    /// Marks every violation paid. Returns the amount settled.
    pub fn pay_all_violations(&mut self) -> u32 {
        let total = self.unpaid_total();
        for violation in &mut self.violations {
            violation.paid = true;
        }
        total
    }

    pub fn submit_renewal(&mut self, request: RenewalRequest) {
        self.renewals.push(request);
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

impl Default for PortalRecord {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_has_two_unpaid_violations() {
        let record = PortalRecord::demo();
        assert_eq!(record.unpaid_violations().count(), 2);
        assert_eq!(record.unpaid_total(), 250);
        assert_eq!(record.unread_notifications(), 1);
    }

    #[test]
    fn paying_clears_the_balance() {
        let mut record = PortalRecord::demo();
        assert_eq!(record.pay_all_violations(), 250);
        assert!(!record.has_unpaid_violations());
        assert_eq!(record.pay_all_violations(), 0);
    }
}
