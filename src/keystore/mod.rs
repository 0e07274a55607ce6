//! File backed key authority: holds the public and master key on disk and
//! issues secret keys.
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use crate::config::AbeConfig;
use crate::error::AbeError;
use crate::schemes::waters11::{W11MasterKey, W11PublicKey, W11SecretKey, Waters11};
use crate::wire::{Envelope, MasterKeyRecord, PublicKeyRecord, SecretKeyRecord};

fn write_owned<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);

    #[cfg(unix)]
    opts.mode(0o600);

    opts.open(path)?.write_all(contents.as_ref())
}

#[derive(Clone, Debug)]
pub struct KeyStore {
    config: AbeConfig,
    scheme: Waters11,
}

impl KeyStore {
    pub fn open(config: AbeConfig) -> Result<KeyStore, AbeError> {
        config.validate()?;
        let scheme = config.scheme()?;
        Ok(KeyStore { config, scheme })
    }

    pub fn config(&self) -> &AbeConfig {
        &self.config
    }

    pub fn scheme(&self) -> &Waters11 {
        &self.scheme
    }

    /// Generates and stores a key pair unless one is already present.
    /// Returns `true` if new keys were written.
    pub fn run_setup(&self) -> Result<bool, AbeError> {
        let pk_path = self.config.public_key_path();
        let msk_path = self.config.master_key_path();
        match (pk_path.exists(), msk_path.exists()) {
            (true, true) => {
                // both must still parse
                self.public_key()?;
                self.master_key()?;
                log::info!("Using existing keys in {}", self.config.key_dir.display());
                Ok(false)
            }
            (false, false) => {
                fs::create_dir_all(&self.config.key_dir)?;
                let (pk, msk) = self.scheme.setup();
                let pk_json = PublicKeyRecord::from_public_key(&pk)?.to_json()?;
                let msk_json = MasterKeyRecord::from_master_key(&msk)?.to_json()?;
                write_owned(&pk_path, pk_json)?;
                if let Err(e) = write_owned(&msk_path, msk_json) {
                    // a public key without its master key would block every later setup
                    let _ = fs::remove_file(&pk_path);
                    return Err(e.into());
                }
                log::info!(
                    "Generated Waters11 keys for a universe of {} attributes:\n{}\n{}",
                    self.scheme.universe_size(),
                    pk_path.display(),
                    msk_path.display()
                );
                Ok(true)
            }
            (true, false) => Err(AbeError::Io(format!("{} exists without a master key", pk_path.display()))),
            (false, true) => Err(AbeError::Io(format!("{} exists without a public key", msk_path.display()))),
        }
    }

    pub fn public_key(&self) -> Result<W11PublicKey, AbeError> {
        let pk = PublicKeyRecord::from_json(&fs::read_to_string(self.config.public_key_path())?)?.to_public_key()?;
        if pk.universe_size != self.scheme.universe_size() {
            return Err(AbeError::Config(format!(
                "stored public key has a universe of size {} but {} is configured",
                pk.universe_size,
                self.scheme.universe_size()
            )));
        }
        Ok(pk)
    }

    fn master_key(&self) -> Result<W11MasterKey, AbeError> {
        MasterKeyRecord::from_json(&fs::read_to_string(self.config.master_key_path())?)?.to_master_key()
    }

    /// Runs KeyGen for the given attribute ids with the stored keys.
    pub fn issue_secret_key(&self, attributes: &[usize]) -> Result<W11SecretKey, AbeError> {
        let pk = self.public_key()?;
        let msk = self.master_key()?;
        let sk = self.scheme.keygen(&pk, &msk, attributes)?;
        log::debug!("Issued secret key for attributes {:?}", sk.attributes);
        Ok(sk)
    }

    /// Resolves a comma separated list of attribute names through the
    /// configured directory and returns the serialized secret key.
    pub fn issue_secret_key_record(&self, attributes: &str) -> Result<SecretKeyRecord, AbeError> {
        let ids = self.config.directory()?.parse_attribute_list(attributes)?;
        SecretKeyRecord::from_secret_key(&self.issue_secret_key(&ids)?)
    }
}
