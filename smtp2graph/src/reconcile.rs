use std::collections::HashSet;

use mail_message::{parse_address_list, Address, Message};

/// Sender and recipients declared through `MAIL FROM` and `RCPT TO`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub sender: Address,
    /// In arrival order, duplicates included
    pub recipients: Vec<Address>,
}

/// Addresses listed in every value of `key`. Values that do not parse as an
/// address list contribute nothing.
fn listed<'a>(message: &'a Message, key: &str) -> impl 'a + Iterator<Item = Address> {
    message
        .headers
        .get_all(key)
        .iter()
        .filter_map(|v| parse_address_list(v).ok())
        .flatten()
}

/// Aligns the message headers with the envelope it is relayed under.
///
/// Envelope recipients that no `To`, `Cc` or `Bcc` header mentions are added
/// to `Bcc`. A `From` that does not mention the envelope sender is replaced
/// by the sender alone. Nothing else is touched.
pub fn reconcile(message: &mut Message, envelope: &Envelope) {
    let present = ["To", "Cc", "Bcc"]
        .iter()
        .flat_map(|k| listed(message, k))
        .map(|a| a.addr)
        .collect::<HashSet<_>>();

    let missing = envelope
        .recipients
        .iter()
        .filter(|r| !present.contains(&r.addr))
        .map(|r| r.to_string())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        let missing = missing.join(", ");
        match message
            .headers
            .get_all_mut("Bcc")
            .and_then(|values| values.last_mut())
            .filter(|last| !last.trim().is_empty())
        {
            Some(last) => {
                last.push_str(", ");
                last.push_str(&missing);
            }
            None => message.headers.set("Bcc", missing),
        }
    }

    let has_sender = listed(message, "From").any(|a| a.addr == envelope.sender.addr);
    if !has_sender {
        message.headers.set("From", envelope.sender.to_string());
    }
}
