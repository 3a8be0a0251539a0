//! In-memory radio used by the attack tests

use parking_lot::Mutex;
use pwngrid_core::{Channel, Error, PromiscuousFilter, Radio, Result, RxCallback};

type Hook = Box<dyn Fn() + Send + Sync>;

pub(crate) struct FakeRadio {
    channel: Mutex<Channel>,
    pub(crate) sent: Mutex<Vec<(Channel, Vec<u8>)>>,
    pub(crate) switches: Mutex<Vec<Channel>>,
    fail_tx: bool,
    on_transmit: Mutex<Option<Hook>>,
}

impl FakeRadio {
    pub(crate) fn on(channel: u8) -> Self {
        Self {
            channel: Mutex::new(Channel::new(channel).unwrap()),
            sent: Mutex::new(Vec::new()),
            switches: Mutex::new(Vec::new()),
            fail_tx: false,
            on_transmit: Mutex::new(None),
        }
    }

    pub(crate) fn failing(channel: u8) -> Self {
        Self {
            fail_tx: true,
            ..Self::on(channel)
        }
    }

    /// Run `hook` inside every transmit call
    pub(crate) fn set_on_transmit(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_transmit.lock() = Some(Box::new(hook));
    }

    pub(crate) fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent.lock().iter().map(|(_, f)| f.clone()).collect()
    }
}

impl Radio for FakeRadio {
    fn channel(&self) -> Channel {
        *self.channel.lock()
    }

    fn set_channel(&self, channel: Channel) -> Result<()> {
        *self.channel.lock() = channel;
        self.switches.lock().push(channel);
        Ok(())
    }

    fn enable_promiscuous(&self, _filter: PromiscuousFilter, _callback: RxCallback) -> Result<()> {
        Ok(())
    }

    fn transmit_raw(&self, frame: &[u8]) -> Result<()> {
        if let Some(hook) = self.on_transmit.lock().as_ref() {
            hook();
        }
        if self.fail_tx {
            return Err(Error::radio("tx rejected"));
        }
        let channel = self.channel();
        self.sent.lock().push((channel, frame.to_vec()));
        Ok(())
    }
}
