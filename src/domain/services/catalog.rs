pub const EVENT_NAME: &str = "Diwali Night";
pub const EVENT_REFERENCE_PREFIX: &str = "DIW";
pub const CURRENCY: &str = "INR";

pub struct TicketType {
    pub id: &'static str,
    pub label: &'static str,
    pub price: i64,
    pub max_per_booking: i32,
}

pub const TICKET_TYPES: &[TicketType] = &[
    TicketType { id: "solo", label: "Solo Pass", price: 499, max_per_booking: 5 },
    TicketType { id: "squad", label: "Squad Pass (entry for 4)", price: 1499, max_per_booking: 3 },
    TicketType { id: "ultimate", label: "Ultimate Pass", price: 1699, max_per_booking: 4 },
];

pub fn find_ticket_type(id: &str) -> Option<&'static TicketType> {
    TICKET_TYPES.iter().find(|t| t.id == id)
}

pub const TICKET_EMAIL_SUBJECT: &str = "Your {{ event_name }} tickets — {{ reference_number }}";
pub const FAILURE_EMAIL_SUBJECT: &str = "Payment failed for {{ event_name }}";
