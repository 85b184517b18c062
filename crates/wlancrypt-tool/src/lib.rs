//! Command implementations behind the `wlancrypt` binary.
//!
//! Every command reads hex from its arguments and writes a report to the
//! given writer, so tests can run them without a process.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::io::Write;

use clap::{Subcommand, ValueEnum};
use thiserror::Error;
use wlancrypt_crypto::{CipherError, Key, KeyMaterial, KeyRole, Pn48, bip, lookup};
use wlancrypt_proto::{CipherSet, CipherType, ProtocolError, build_ie, check_ie, mac};

/// Tool failure.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Argument is not valid hex
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Element or frame did not parse
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Cipher operation failed
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Output could not be written
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// BIP cipher choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BipCipher {
    /// BIP-CMAC-128
    Cmac,
    /// BIP-CMAC-256
    Cmac256,
    /// BIP-GMAC-128
    Gmac,
    /// BIP-GMAC-256
    Gmac256,
}

impl From<BipCipher> for CipherType {
    fn from(cipher: BipCipher) -> Self {
        match cipher {
            BipCipher::Cmac => Self::AesCmac,
            BipCipher::Cmac256 => Self::AesCmac256,
            BipCipher::Gmac => Self::AesGmac,
            BipCipher::Gmac256 => Self::AesGmac256,
        }
    }
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse an RSN, WPA or WAPI element and print what it offers
    Decode {
        /// Element bytes including id and length, as hex
        ie: String,
    },

    /// Parse an element and build it again from the parsed policy
    Rebuild {
        /// Element bytes including id and length, as hex
        ie: String,
    },

    /// Append an MMIE to a management frame, or verify one
    Mmie {
        /// Management frame as hex (with its MMIE when verifying)
        frame: String,

        /// IGTK as hex
        #[arg(long)]
        igtk: String,

        /// BIP variant
        #[arg(long, value_enum, default_value = "cmac")]
        cipher: BipCipher,

        /// IPN to place in the MMIE
        #[arg(long, default_value_t = 1)]
        ipn: u64,

        /// IGTK key id (4 or 5)
        #[arg(long, default_value_t = 4)]
        key_id: u16,

        /// Verify the frame's MMIE instead of adding one
        #[arg(long)]
        verify: bool,
    },
}

/// Run `command`, writing its report to `out`.
pub fn run(command: &Command, out: &mut impl Write) -> Result<(), ToolError> {
    match command {
        Command::Decode { ie } => decode(&hex::decode(ie.trim())?, out),
        Command::Rebuild { ie } => {
            let (kind, params) = check_ie(&hex::decode(ie.trim())?)?;
            let rebuilt = build_ie(kind, &params)?;
            tracing::debug!(element = kind.name(), len = rebuilt.len(), "element rebuilt");
            writeln!(out, "{}", hex::encode(rebuilt))?;
            Ok(())
        },
        Command::Mmie { frame, igtk, cipher, ipn, key_id, verify } => {
            let mut frame = hex::decode(frame.trim())?;
            let key = igtk_key((*cipher).into(), *key_id, &hex::decode(igtk.trim())?)?;
            let hdr_len = mac::header_len(&frame)?;
            if *verify {
                let ipn = bip::verify(&key, &frame, hdr_len)?;
                writeln!(out, "valid ipn={}", ipn.get())?;
            } else {
                bip::protect(&key, &mut frame, hdr_len, Pn48::new(*ipn))?;
                writeln!(out, "{}", hex::encode(&frame))?;
            }
            Ok(())
        },
    }
}

fn igtk_key(cipher: CipherType, key_id: u16, bytes: &[u8]) -> Result<Key, ToolError> {
    let mut key = Key::new(cipher, KeyRole::Igtk, key_id, KeyMaterial::new(cipher, bytes)?);
    lookup(cipher)?.setkey(&mut key)?;
    Ok(key)
}

fn cipher_names(set: CipherSet) -> String {
    let names: Vec<&str> = set.ciphers().map(CipherType::name).collect();
    if names.is_empty() { "-".to_owned() } else { names.join(", ") }
}

fn decode(ie: &[u8], out: &mut impl Write) -> Result<(), ToolError> {
    let (kind, params) = check_ie(ie)?;
    let akms: Vec<String> = params.key_mgmt.suites().map(|akm| format!("{akm:?}")).collect();

    writeln!(out, "element:        {}", kind.name())?;
    writeln!(out, "group cipher:   {}", cipher_names(params.mcast_cipher))?;
    writeln!(out, "pairwise:       {}", cipher_names(params.ucast_ciphers))?;
    writeln!(out, "akm:            {}", akms.join(", "))?;
    writeln!(out, "capabilities:   {:#06x}", params.rsn_caps.bits())?;
    writeln!(out, "mfp:            capable={} required={}", params.mfp_capable(), params.mfp_required())?;
    writeln!(out, "pmkids:         {}", params.pmkids.len())?;
    writeln!(out, "mgmt cipher:    {}", cipher_names(params.mgmt_cipher))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSN: &str = "30140100000fac040100000fac040100000fac020000";

    fn run_to_string(command: &Command) -> Result<String, ToolError> {
        let mut out = Vec::new();
        run(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn decode_reports_suites() {
        let report = run_to_string(&Command::Decode { ie: RSN.to_owned() }).unwrap();
        assert!(report.contains("element:        RSN"), "{report}");
        assert!(report.contains("pairwise:       CCMP-128"), "{report}");
        assert!(report.contains("Psk"), "{report}");
        assert!(report.contains("mgmt cipher:    -"), "{report}");
    }

    #[test]
    fn decode_report_layout() {
        let report = run_to_string(&Command::Decode { ie: RSN.to_owned() }).unwrap();
        insta::assert_snapshot!(report, @r"
        element:        RSN
        group cipher:   CCMP-128
        pairwise:       CCMP-128
        akm:            Psk
        capabilities:   0x0000
        mfp:            capable=false required=false
        pmkids:         0
        mgmt cipher:    -
        ");
    }

    #[test]
    fn rebuild_reproduces_canonical_element() {
        assert_eq!(run_to_string(&Command::Rebuild { ie: RSN.to_owned() }).unwrap().trim(), RSN);
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(matches!(run_to_string(&Command::Decode { ie: "zz".to_owned() }), Err(ToolError::Hex(_))));
        assert!(matches!(
            run_to_string(&Command::Decode { ie: "3001".to_owned() }),
            Err(ToolError::Protocol(_))
        ));
    }

    #[test]
    fn mmie_protect_then_verify() {
        let deauth = "c0000000ffffffffffff02000000000102000000000100000700";
        let igtk = "4b".repeat(16);
        let protect = Command::Mmie {
            frame: deauth.to_owned(),
            igtk: igtk.clone(),
            cipher: BipCipher::Cmac,
            ipn: 7,
            key_id: 4,
            verify: false,
        };
        let protected = run_to_string(&protect).unwrap();
        assert_eq!(protected.trim().len(), deauth.len() + 2 * 18);

        let verify = Command::Mmie {
            frame: protected.trim().to_owned(),
            igtk,
            cipher: BipCipher::Cmac,
            ipn: 0,
            key_id: 4,
            verify: true,
        };
        assert_eq!(run_to_string(&verify).unwrap().trim(), "valid ipn=7");
    }
}
