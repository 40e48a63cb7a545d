// # DNS Projection
//
// Flattens a domain [`Check`] into the DNS records the domain owner has to
// publish for mail to be forwarded.
//
// ## Order
//
// | record | type  | name                     |
// |--------|-------|--------------------------|
// | mx     | MX    | ""                       |
// | spf    | TXT   | ""                       |
// | dmarc  | TXT   | ""                       |
// | dkim1  | CNAME | "dkimprovmx1._domainkey" |
// | dkim2  | CNAME | "dkimprovmx2._domainkey" |
//
// Within a record the expected values keep their order. A record without
// expected values contributes nothing.
//
// The projection is derived data: it is recomputed from a fresh check on
// every read and never diffed.

use crate::model::{Check, DnsRecord, DnsRecordType, Record};

/// Relative name of the first DKIM CNAME
pub const DKIM1_NAME: &str = "dkimprovmx1._domainkey";

/// Relative name of the second DKIM CNAME
pub const DKIM2_NAME: &str = "dkimprovmx2._domainkey";

/// Project a check into an ordered list of DNS records
pub fn project(check: &Check) -> Vec<DnsRecord> {
    let sources: [(&Record, DnsRecordType, &str); 5] = [
        (&check.mx, DnsRecordType::Mx, ""),
        (&check.spf, DnsRecordType::Txt, ""),
        (&check.dmarc, DnsRecordType::Txt, ""),
        (&check.dkim1, DnsRecordType::Cname, DKIM1_NAME),
        (&check.dkim2, DnsRecordType::Cname, DKIM2_NAME),
    ];

    sources
        .into_iter()
        .flat_map(|(record, record_type, name)| expected_records(record, record_type, name))
        .collect()
}

fn expected_records(record: &Record, record_type: DnsRecordType, name: &str) -> Vec<DnsRecord> {
    let Some(expected) = &record.expected else {
        return Vec::new();
    };

    expected
        .iter()
        .map(|value| DnsRecord {
            record_type,
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}
