//! Cipher, AKM and authentication-mode identifiers.
//!
//! Each identifier has an enum form (what a key or selector *is*) and a
//! bit-set form (what a policy *allows*). The set bit for a value is
//! `1 << value as u32`, so the two convert without a lookup table.

use bitflags::bitflags;

/// OUI used by RSN suite selectors.
pub const RSN_OUI: [u8; 3] = [0x00, 0x0f, 0xac];
/// Microsoft OUI used by the WPA vendor element.
pub const WPA_OUI: [u8; 3] = [0x00, 0x50, 0xf2];
/// OUI used by WAPI suite selectors.
pub const WAPI_OUI: [u8; 3] = [0x00, 0x14, 0x72];
/// Wi-Fi Alliance OUI (OSEN, DPP).
pub const WFA_OUI: [u8; 3] = [0x50, 0x6f, 0x9a];
/// Cisco OUI (CCKM).
pub const CCKM_OUI: [u8; 3] = [0x00, 0x40, 0x96];

/// Cipher used by a key or negotiated for a traffic class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CipherType {
    /// WEP with any of the 40/104/128-bit key sizes
    Wep = 0,
    /// TKIP
    Tkip = 1,
    /// CCMP-128
    AesCcm = 3,
    /// WAPI SMS4
    WapiSms4 = 4,
    /// BIP-CMAC-128
    AesCmac = 6,
    /// CCMP-256
    AesCcm256 = 7,
    /// BIP-CMAC-256
    AesCmac256 = 8,
    /// GCMP-128
    AesGcm = 9,
    /// GCMP-256
    AesGcm256 = 10,
    /// BIP-GMAC-128
    AesGmac = 11,
    /// BIP-GMAC-256
    AesGmac256 = 12,
    /// FILS authenticated (re)association encryption
    FilsAead = 14,
    /// WEP-40
    Wep40 = 15,
    /// WEP-104
    Wep104 = 16,
    /// No cipher ("use group cipher" pairwise selector)
    None = 17,
}

impl CipherType {
    /// All cipher types in canonical (strongest-first within class) order.
    pub const ALL: [Self; 15] = [
        Self::AesGcm256,
        Self::AesCcm256,
        Self::AesGcm,
        Self::AesCcm,
        Self::Tkip,
        Self::Wep104,
        Self::Wep40,
        Self::Wep,
        Self::WapiSms4,
        Self::AesGmac256,
        Self::AesCmac256,
        Self::AesGmac,
        Self::AesCmac,
        Self::FilsAead,
        Self::None,
    ];

    /// Bit representing this cipher inside a [`CipherSet`].
    pub fn bit(self) -> CipherSet {
        CipherSet::from_bits_retain(1 << self as u32)
    }

    /// Management-frame integrity ciphers (BIP family).
    pub fn is_mgmt(self) -> bool {
        matches!(self, Self::AesCmac | Self::AesCmac256 | Self::AesGmac | Self::AesGmac256)
    }

    /// Any WEP flavour.
    pub fn is_wep(self) -> bool {
        matches!(self, Self::Wep | Self::Wep40 | Self::Wep104)
    }

    /// Human-readable suite name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Wep => "WEP",
            Self::Wep40 => "WEP-40",
            Self::Wep104 => "WEP-104",
            Self::Tkip => "TKIP",
            Self::AesCcm => "CCMP-128",
            Self::AesCcm256 => "CCMP-256",
            Self::AesGcm => "GCMP-128",
            Self::AesGcm256 => "GCMP-256",
            Self::AesCmac => "BIP-CMAC-128",
            Self::AesCmac256 => "BIP-CMAC-256",
            Self::AesGmac => "BIP-GMAC-128",
            Self::AesGmac256 => "BIP-GMAC-256",
            Self::WapiSms4 => "WAPI-SMS4",
            Self::FilsAead => "FILS-AEAD",
            Self::None => "NONE",
        }
    }

    /// RSN suite type octet (OUI 00-0F-AC).
    pub fn rsn_suite_type(self) -> Option<u8> {
        Some(match self {
            Self::None => 0,
            Self::Wep40 | Self::Wep => 1,
            Self::Tkip => 2,
            Self::AesCcm => 4,
            Self::Wep104 => 5,
            Self::AesCmac => 6,
            Self::AesGcm => 8,
            Self::AesGcm256 => 9,
            Self::AesCcm256 => 10,
            Self::AesGmac => 11,
            Self::AesGmac256 => 12,
            Self::AesCmac256 => 13,
            Self::WapiSms4 | Self::FilsAead => return None,
        })
    }

    /// Inverse of [`CipherType::rsn_suite_type`].
    pub fn from_rsn_suite_type(suite: u8) -> Option<Self> {
        Some(match suite {
            0 => Self::None,
            1 => Self::Wep40,
            2 => Self::Tkip,
            4 => Self::AesCcm,
            5 => Self::Wep104,
            6 => Self::AesCmac,
            8 => Self::AesGcm,
            9 => Self::AesGcm256,
            10 => Self::AesCcm256,
            11 => Self::AesGmac,
            12 => Self::AesGmac256,
            13 => Self::AesCmac256,
            _ => return None,
        })
    }

    /// WPA vendor suite type octet (OUI 00-50-F2).
    pub fn wpa_suite_type(self) -> Option<u8> {
        Some(match self {
            Self::None => 0,
            Self::Wep40 | Self::Wep => 1,
            Self::Tkip => 2,
            Self::AesCcm => 4,
            Self::Wep104 => 5,
            _ => return None,
        })
    }

    /// Inverse of [`CipherType::wpa_suite_type`].
    pub fn from_wpa_suite_type(suite: u8) -> Option<Self> {
        Some(match suite {
            0 => Self::None,
            1 => Self::Wep40,
            2 => Self::Tkip,
            4 => Self::AesCcm,
            5 => Self::Wep104,
            _ => return None,
        })
    }
}

bitflags! {
    /// Set of allowed ciphers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CipherSet: u32 {
        /// WEP
        const WEP = 1 << CipherType::Wep as u32;
        /// TKIP
        const TKIP = 1 << CipherType::Tkip as u32;
        /// CCMP-128
        const AES_CCM = 1 << CipherType::AesCcm as u32;
        /// WAPI SMS4
        const WAPI_SMS4 = 1 << CipherType::WapiSms4 as u32;
        /// BIP-CMAC-128
        const AES_CMAC = 1 << CipherType::AesCmac as u32;
        /// CCMP-256
        const AES_CCM_256 = 1 << CipherType::AesCcm256 as u32;
        /// BIP-CMAC-256
        const AES_CMAC_256 = 1 << CipherType::AesCmac256 as u32;
        /// GCMP-128
        const AES_GCM = 1 << CipherType::AesGcm as u32;
        /// GCMP-256
        const AES_GCM_256 = 1 << CipherType::AesGcm256 as u32;
        /// BIP-GMAC-128
        const AES_GMAC = 1 << CipherType::AesGmac as u32;
        /// BIP-GMAC-256
        const AES_GMAC_256 = 1 << CipherType::AesGmac256 as u32;
        /// FILS AEAD
        const FILS_AEAD = 1 << CipherType::FilsAead as u32;
        /// WEP-40
        const WEP_40 = 1 << CipherType::Wep40 as u32;
        /// WEP-104
        const WEP_104 = 1 << CipherType::Wep104 as u32;
        /// None
        const NONE = 1 << CipherType::None as u32;
    }
}

impl CipherSet {
    /// Whether `cipher` is allowed by this set. WEP keys match any WEP bit.
    pub fn allows(self, cipher: CipherType) -> bool {
        if cipher.is_wep() {
            return self.intersects(Self::WEP | Self::WEP_40 | Self::WEP_104);
        }
        self.contains(cipher.bit())
    }

    /// Members in canonical order.
    pub fn ciphers(self) -> impl Iterator<Item = CipherType> {
        CipherType::ALL.into_iter().filter(move |c| self.contains(c.bit()))
    }

    /// Strongest member, used when a single selector must be emitted.
    pub fn preferred(self) -> Option<CipherType> {
        self.ciphers().next()
    }
}

impl From<CipherType> for CipherSet {
    fn from(cipher: CipherType) -> Self {
        cipher.bit()
    }
}

/// Authentication and key management suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AkmSuite {
    /// IEEE 802.1X
    Ieee8021x = 0,
    /// PSK
    Psk = 1,
    /// No AKM
    None = 2,
    /// 802.1X without WPA
    Ieee8021xNoWpa = 3,
    /// WPA-None (IBSS)
    WpaNone = 4,
    /// FT over 802.1X
    FtIeee8021x = 5,
    /// FT-PSK
    FtPsk = 6,
    /// 802.1X with SHA-256
    Ieee8021xSha256 = 7,
    /// PSK with SHA-256
    PskSha256 = 8,
    /// WPS
    Wps = 9,
    /// SAE
    Sae = 10,
    /// FT-SAE
    FtSae = 11,
    /// WAPI PSK
    WapiPsk = 12,
    /// WAPI certificate
    WapiCert = 13,
    /// Cisco CCKM
    Cckm = 14,
    /// Hotspot 2.0 OSEN
    Osen = 15,
    /// Suite B
    Ieee8021xSuiteB = 16,
    /// Suite B 192-bit
    Ieee8021xSuiteB192 = 17,
    /// FILS SHA-256
    FilsSha256 = 18,
    /// FILS SHA-384
    FilsSha384 = 19,
    /// FT FILS SHA-256
    FtFilsSha256 = 20,
    /// FT FILS SHA-384
    FtFilsSha384 = 21,
    /// OWE
    Owe = 22,
    /// DPP
    Dpp = 23,
    /// FT 802.1X SHA-384
    FtIeee8021xSha384 = 24,
}

impl AkmSuite {
    /// All suites in canonical emission order.
    pub const ALL: [Self; 25] = [
        Self::Ieee8021x,
        Self::Psk,
        Self::None,
        Self::Ieee8021xNoWpa,
        Self::WpaNone,
        Self::FtIeee8021x,
        Self::FtPsk,
        Self::Ieee8021xSha256,
        Self::PskSha256,
        Self::Wps,
        Self::Sae,
        Self::FtSae,
        Self::WapiPsk,
        Self::WapiCert,
        Self::Cckm,
        Self::Osen,
        Self::Ieee8021xSuiteB,
        Self::Ieee8021xSuiteB192,
        Self::FilsSha256,
        Self::FilsSha384,
        Self::FtFilsSha256,
        Self::FtFilsSha384,
        Self::Owe,
        Self::Dpp,
        Self::FtIeee8021xSha384,
    ];

    /// Bit representing this suite inside an [`AkmSet`].
    pub fn bit(self) -> AkmSet {
        AkmSet::from_bits_retain(1 << self as u32)
    }

    /// Full RSN selector for this AKM.
    pub fn rsn_selector(self) -> Option<[u8; 4]> {
        let (oui, suite) = match self {
            Self::Ieee8021x => (RSN_OUI, 1),
            Self::Psk => (RSN_OUI, 2),
            Self::FtIeee8021x => (RSN_OUI, 3),
            Self::FtPsk => (RSN_OUI, 4),
            Self::Ieee8021xSha256 => (RSN_OUI, 5),
            Self::PskSha256 => (RSN_OUI, 6),
            Self::Sae => (RSN_OUI, 8),
            Self::FtSae => (RSN_OUI, 9),
            Self::Ieee8021xSuiteB => (RSN_OUI, 11),
            Self::Ieee8021xSuiteB192 => (RSN_OUI, 12),
            Self::FtIeee8021xSha384 => (RSN_OUI, 13),
            Self::FilsSha256 => (RSN_OUI, 14),
            Self::FilsSha384 => (RSN_OUI, 15),
            Self::FtFilsSha256 => (RSN_OUI, 16),
            Self::FtFilsSha384 => (RSN_OUI, 17),
            Self::Owe => (RSN_OUI, 18),
            Self::Osen => (WFA_OUI, 1),
            Self::Dpp => (WFA_OUI, 2),
            Self::Cckm => (CCKM_OUI, 0),
            _ => return None,
        };
        Some(selector(oui, suite))
    }

    /// Inverse of [`AkmSuite::rsn_selector`].
    pub fn from_rsn_selector(sel: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|akm| akm.rsn_selector() == Some(sel))
    }

    /// Full WPA selector for this AKM.
    pub fn wpa_selector(self) -> Option<[u8; 4]> {
        match self {
            Self::Ieee8021x => Some(selector(WPA_OUI, 1)),
            Self::Psk => Some(selector(WPA_OUI, 2)),
            Self::WpaNone => Some(selector(WPA_OUI, 0)),
            Self::Cckm => Some(selector(CCKM_OUI, 0)),
            _ => None,
        }
    }

    /// Inverse of [`AkmSuite::wpa_selector`].
    pub fn from_wpa_selector(sel: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|akm| akm.wpa_selector() == Some(sel))
    }

    /// Full WAPI selector for this AKM.
    pub fn wapi_selector(self) -> Option<[u8; 4]> {
        match self {
            Self::WapiCert => Some(selector(WAPI_OUI, 1)),
            Self::WapiPsk => Some(selector(WAPI_OUI, 2)),
            _ => None,
        }
    }

    /// Inverse of [`AkmSuite::wapi_selector`].
    pub fn from_wapi_selector(sel: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|akm| akm.wapi_selector() == Some(sel))
    }
}

bitflags! {
    /// Set of allowed AKM suites.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AkmSet: u32 {
        /// IEEE 802.1X
        const IEEE8021X = 1 << AkmSuite::Ieee8021x as u32;
        /// PSK
        const PSK = 1 << AkmSuite::Psk as u32;
        /// No AKM
        const NONE = 1 << AkmSuite::None as u32;
        /// 802.1X without WPA
        const IEEE8021X_NO_WPA = 1 << AkmSuite::Ieee8021xNoWpa as u32;
        /// WPA-None
        const WPA_NONE = 1 << AkmSuite::WpaNone as u32;
        /// FT over 802.1X
        const FT_IEEE8021X = 1 << AkmSuite::FtIeee8021x as u32;
        /// FT-PSK
        const FT_PSK = 1 << AkmSuite::FtPsk as u32;
        /// 802.1X SHA-256
        const IEEE8021X_SHA256 = 1 << AkmSuite::Ieee8021xSha256 as u32;
        /// PSK SHA-256
        const PSK_SHA256 = 1 << AkmSuite::PskSha256 as u32;
        /// WPS
        const WPS = 1 << AkmSuite::Wps as u32;
        /// SAE
        const SAE = 1 << AkmSuite::Sae as u32;
        /// FT-SAE
        const FT_SAE = 1 << AkmSuite::FtSae as u32;
        /// WAPI PSK
        const WAPI_PSK = 1 << AkmSuite::WapiPsk as u32;
        /// WAPI certificate
        const WAPI_CERT = 1 << AkmSuite::WapiCert as u32;
        /// CCKM
        const CCKM = 1 << AkmSuite::Cckm as u32;
        /// OSEN
        const OSEN = 1 << AkmSuite::Osen as u32;
        /// Suite B
        const IEEE8021X_SUITE_B = 1 << AkmSuite::Ieee8021xSuiteB as u32;
        /// Suite B 192
        const IEEE8021X_SUITE_B_192 = 1 << AkmSuite::Ieee8021xSuiteB192 as u32;
        /// FILS SHA-256
        const FILS_SHA256 = 1 << AkmSuite::FilsSha256 as u32;
        /// FILS SHA-384
        const FILS_SHA384 = 1 << AkmSuite::FilsSha384 as u32;
        /// FT FILS SHA-256
        const FT_FILS_SHA256 = 1 << AkmSuite::FtFilsSha256 as u32;
        /// FT FILS SHA-384
        const FT_FILS_SHA384 = 1 << AkmSuite::FtFilsSha384 as u32;
        /// OWE
        const OWE = 1 << AkmSuite::Owe as u32;
        /// DPP
        const DPP = 1 << AkmSuite::Dpp as u32;
        /// FT 802.1X SHA-384
        const FT_IEEE8021X_SHA384 = 1 << AkmSuite::FtIeee8021xSha384 as u32;
    }
}

impl AkmSet {
    /// Members in canonical order.
    pub fn suites(self) -> impl Iterator<Item = AkmSuite> {
        AkmSuite::ALL.into_iter().filter(move |a| self.contains(a.bit()))
    }
}

impl From<AkmSuite> for AkmSet {
    fn from(akm: AkmSuite) -> Self {
        akm.bit()
    }
}

bitflags! {
    /// Authentication modes a vdev or peer is willing to use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AuthModeSet: u32 {
        /// No authentication recorded
        const NONE = 1 << 0;
        /// Open system
        const OPEN = 1 << 1;
        /// Shared key
        const SHARED = 1 << 2;
        /// Open or shared
        const AUTO = 1 << 3;
        /// WPA (vendor element)
        const WPA = 1 << 4;
        /// RSNA (WPA2/WPA3)
        const RSNA = 1 << 5;
        /// Cisco CCKM
        const CCKM = 1 << 6;
        /// WAPI
        const WAPI = 1 << 7;
        /// SAE
        const SAE = 1 << 8;
        /// FILS shared key
        const FILS_SK = 1 << 9;
    }
}

/// Assemble a 4-byte suite selector.
pub fn selector(oui: [u8; 3], suite: u8) -> [u8; 4] {
    [oui[0], oui[1], oui[2], suite]
}

/// RSN cipher selector for `cipher`.
pub fn rsn_cipher_selector(cipher: CipherType) -> Option<[u8; 4]> {
    cipher.rsn_suite_type().map(|t| selector(RSN_OUI, t))
}

/// Cipher named by an RSN selector.
pub fn cipher_from_rsn_selector(sel: [u8; 4]) -> Option<CipherType> {
    if sel[..3] != RSN_OUI {
        return None;
    }
    CipherType::from_rsn_suite_type(sel[3])
}

/// WPA cipher selector for `cipher`.
pub fn wpa_cipher_selector(cipher: CipherType) -> Option<[u8; 4]> {
    cipher.wpa_suite_type().map(|t| selector(WPA_OUI, t))
}

/// Cipher named by a WPA selector.
pub fn cipher_from_wpa_selector(sel: [u8; 4]) -> Option<CipherType> {
    if sel[..3] != WPA_OUI {
        return None;
    }
    CipherType::from_wpa_suite_type(sel[3])
}

/// WAPI cipher selector for `cipher` (SMS4 only).
pub fn wapi_cipher_selector(cipher: CipherType) -> Option<[u8; 4]> {
    (cipher == CipherType::WapiSms4).then(|| selector(WAPI_OUI, 1))
}

/// Cipher named by a WAPI selector.
pub fn cipher_from_wapi_selector(sel: [u8; 4]) -> Option<CipherType> {
    (sel == selector(WAPI_OUI, 1)).then_some(CipherType::WapiSms4)
}
