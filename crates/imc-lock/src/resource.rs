/// The three hardware mailboxes/buses this crate serialises access to
/// (spec §4.2/§5). Lock order across a single snapshot operation is always
/// `Smbus` → `BiosMailbox` → `OcMailbox`; never hold two at once for an
/// operation that only needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Smbus,
    BiosMailbox,
    OcMailbox,
}

impl Resource {
    pub fn local_name(self) -> &'static str {
        match self {
            Resource::Smbus => r"Local\Access_SMBUS.HTP.Method",
            Resource::BiosMailbox => r"Local\Access_Intel_BIOS_Mailbox",
            Resource::OcMailbox => r"Local\Access_Intel_OC_Mailbox",
        }
    }

    pub fn global_name(self) -> &'static str {
        match self {
            Resource::Smbus => r"Global\Access_SMBUS.HTP.Method",
            Resource::BiosMailbox => r"Global\Access_Intel_BIOS_Mailbox",
            Resource::OcMailbox => r"Global\Access_Intel_OC_Mailbox",
        }
    }
}
