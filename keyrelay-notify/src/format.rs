/// Message sent to the customer when an unlock code is delivered.
pub fn format_unlock_code_message(
    order_number: &str,
    service_name: &str,
    code: &str,
    company_name: &str,
) -> String {
    format!(
        "{company_name}\n\nOrder: {order_number}\nService: {service_name}\n\nYour unlock code:\n{code}\n\nThank you for your business!"
    )
}

/// Generic order-status update message.
pub fn format_order_status_message(order_number: &str, status: &str, company_name: &str) -> String {
    format!("{company_name}\n\nOrder {order_number}\nStatus: {status}\n\nCheck your account for details.")
}
