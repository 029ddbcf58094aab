//! Fixed lookup tables for the known export layouts.

/// Marker found in the preview row of a common-courtesy export.
pub const COMMON_COURTESY_MARKER: &str = "Common Courtesy";

/// Rows that may hold the header of a common-courtesy export.
pub const COMMON_COURTESY_HEADER_ROWS: [usize; 3] = [0, 4, 5];

/// Lowercased text identifying the common-courtesy header row.
pub const COMMON_COURTESY_HEADER_PROBE: &str = "trip/eats id";

/// If none of these is in row 0, the export has no header row.
pub const HEADER_ANCHORS: [&str; 3] = ["Last Name", "Passenger Number", "Ride ID"];

/// Column inspected to tell the two headerless providers apart.
pub const PROVIDER_PROBE_COLUMN: usize = 6;

/// Provider A headerless export (its probe column holds text, not digits).
pub const PROVIDER_A_HEADERS: [&str; 58] = [
    "Trip/Eats ID", "Transaction Timestamp (UTC)", "Request Date (UTC)", "Request Time (UTC)",
    "Request Date (Local)", "Request Time (Local)", "Request Type", "Pickup Date (UTC)",
    "Pickup Time (UTC)", "Pickup Date (Local)", "Pickup Time (Local)", "Drop-off Date (UTC)",
    "Drop-off Time (UTC)", "Drop-off Date (Local)", "Drop-off Time (Local)",
    "Request Timezone Offset from UTC", "First Name", "Last Name", "Email", "Employee ID",
    "Service", "City", "Distance (mi)", "Haversine Distance (mi)", "Duration (min)",
    "Pickup Address", "Pickup Latitude", "Pickup Longitude", "Drop-off Address",
    "Drop Off Latitude", "Drop Off Longitude", "Ride Status", "Expense Code", "Internal Note",
    "Invoices", "Program", "Group", "Payment Method", "Transaction Type",
    "Fare in Local Currency (excl. Taxes)", "Taxes in Local Currency", "Tip in Local Currency",
    "Transaction Amount in Local Currency (incl. Taxes)", "Local Currency Code",
    "Fare in USD (excl. Taxes)", "Taxes in USD", "Tip in USD",
    "Transaction Amount in USD (incl. Taxes)",
    "Estimated Service and Technology Fee (incl. Taxes, if any) in USD", "Health Dashboard URL",
    "Invoice Number", "Driver First Name", "Guest First Name", "Guest Last Name",
    "Passenger Number", "Deductions in Local Currency", "Member ID", "Plan ID",
];

/// Provider B headerless export (its probe column holds digits).
pub const PROVIDER_B_HEADERS: [&str; 59] = [
    "Ride ID", "Pickup Date (UTC)", "Pickup Time (UTC)", "Pickup Date (Local)",
    "Pickup Time (Local)", "Pickup Timezone offset from UTC", "Drop-off Date (UTC)",
    "Drop-off Time (UTC)", "Drop-off Date (Local)", "Drop-off Time (Local)", "First Name",
    "Last Name", "Email", "Pickup Address", "Pickup City", "Pickup State", "Pickup Zip Code",
    "Drop-off Address", "Drop-off City", "Drop-off State", "Drop-off Zip Code",
    "Request Address", "Request City", "Request State", "Request Zip Code",
    "Destination Address", "Destination City", "Destination State", "Destination Zip Code",
    "Distance (miles)", "Duration (minutes)", "Ride Fare", "Ride Fees", "Ride Discounts",
    "Ride Tip", "Ride Cost", "Business Services Fee", "Transaction Date (UTC)",
    "Transaction Time (UTC)", "Transaction Amount", "Transaction Currency", "Transaction Type",
    "Expense Code", "Expense Note", "Ride Type", "Employee ID", "Custom Tag 1", "Custom Tag 2",
    "Passenger Number", "Requester Name", "Requester Email", "Internal Note", "Fare Type",
    "Scheduled Ride Id", "Flex Ride Id", "Pickup Latitude", "Pickup Longitude",
    "Drop-off Latitude", "Drop-off Longitude",
];

/// Renames applied to every layout. Targets may collide; the first
/// occurrence of a name wins afterwards.
pub const COLUMN_RENAMES: [(&str, &str); 7] = [
    ("Distance (mi)", "Distance (miles)"),
    ("Transaction Amount in Local Currency (incl. Taxes)", "Transaction Amount"),
    ("Ride Status", "Transaction Type"),
    ("Guest Phone Number", "Passenger Number"),
    ("Expense Memo", "Internal Note"),
    ("Email", "Email Info"),
    ("Requester Email", "Email Info"),
];

/// Renames applied to headerless exports before they are cut down to the
/// canonical columns.
pub const HEADERLESS_RENAMES: [(&str, &str); 4] = [
    ("Distance (mi)", "Distance (miles)"),
    ("Transaction Amount in Local Currency (incl. Taxes)", "Transaction Amount"),
    ("Guest Phone Number", "Passenger Number"),
    ("Expense Memo", "Internal Note"),
];

/// Provider-specific columns that never reach the canonical schema.
pub const DENIED_COLUMNS: [&str; 90] = [
    "Ride ID", "Pickup Time (UTC)", "Pickup Timezone offset from UTC", "Pickup Date (UTC)",
    "Drop-off Time (Local)", "Drop-off Time (UTC)", "Drop-off Timezone", "Drop-off Date (Local)",
    "Drop-off Date (UTC)", "Email", "Pickup City", "Pickup State", "Pickup Zip Code",
    "Requester Name", "Drop-off City", "Drop-off State", "Drop-off Zip Code", "Request Address",
    "Request City", "Request State", "Request Zip Code", "Destination Address",
    "Destination City", "Destination State", "Destination Zip Code", "Duration (minutes)",
    "Ride Fare", "Ride Fees", "Ride Discounts", "Ride Tip", "Ride Cost", "Business Services Fee",
    "Transaction Date (UTC)", "Transaction Time (UTC)", "Transaction Currency",
    "Transaction Outcome", "Expense Code", "Expense Note", "Ride Type", "Employee ID",
    "Custom Tag 1", "Custom Tag 2", "Fare Type", "Scheduled Ride Id", "Flex Ride Id",
    "Flex Ride", "Pickup Latitude", "Pickup Longitude", "Drop-off Latitude",
    "Drop-off Longitude", "Trip/Eats ID", "Transaction Timestamp (UTC)", "Request Date (UTC)",
    "Request Time (UTC)", "Request Date (Local)", "Request Time (Local)", "Request Type",
    "Request Timezone Offset from UTC", "Service", "City", "Haversine Distance (mi)",
    "Duration (min)", "Drop Off Latitude", "Drop Off Longitude", "Invoices", "Program", "Group",
    "Payment Method", "Fare in Local Currency (excl. Taxes)", "Taxes in Local Currency",
    "Tip in Local Currency", "Local Currency Code", "Fare in USD (excl. Taxes)", "Taxes in USD",
    "Tip in USD", "Transaction Amount in USD (incl. Taxes)",
    "Estimated Service and Technology Fee (incl. Taxes, if any) in USD",
    "Health Dashboard URL", "Invoice Number", "Driver First Name",
    "Deductions in Local Currency", "Member ID", "Plan ID", "Network Transaction Id",
    "IsGroupOrder", "Fulfilment Type", "Country", "Cancellation type",
    "Membership Savings(Local Currency)", "Granular Service Purpose Type",
];

pub const GUEST_FIRST_NAME: &str = "Guest First Name";
pub const GUEST_LAST_NAME: &str = "Guest Last Name";
pub const EXPENSE_MEMO: &str = "Expense Memo";
pub const RIDE_STATUS: &str = "Ride Status";
pub const EMAIL: &str = "Email";
pub const REQUESTER_EMAIL: &str = "Requester Email";
