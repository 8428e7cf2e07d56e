use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_hal::{
    blocking::{
        delay::DelayMs,
        spi::{Transfer, Write},
    },
    digital::v2::{InputPin, OutputPin},
};

use lora_forwarder::radio::{BusError, RegisterBus, SpiRegisterBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    ChipSelect(bool),
    Transfer([u8; 2]),
    Write([u8; 2]),
    Reset(bool),
    Delay(u32),
}

type Log = Rc<RefCell<Vec<Event>>>;

struct FakeSpi {
    log: Log,
    reply: u8,
    fail: bool,
}

impl Transfer<u8> for FakeSpi {
    type Error = ();

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
        self.log
            .borrow_mut()
            .push(Event::Transfer([words[0], words[1]]));
        if self.fail {
            return Err(());
        }
        words[1] = self.reply;
        Ok(words)
    }
}

impl Write<u8> for FakeSpi {
    type Error = ();

    fn write(&mut self, words: &[u8]) -> Result<(), ()> {
        self.log.borrow_mut().push(Event::Write([words[0], words[1]]));
        if self.fail {
            return Err(());
        }
        Ok(())
    }
}

struct FakeOutput {
    log: Log,
    event: fn(bool) -> Event,
}

impl OutputPin for FakeOutput {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push((self.event)(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push((self.event)(true));
        Ok(())
    }
}

struct FakeInput(bool);

impl InputPin for FakeInput {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.0)
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.0)
    }
}

struct FakeDelay(Log);

impl DelayMs<u32> for FakeDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(Event::Delay(ms));
    }
}

type TestBus = SpiRegisterBus<FakeSpi, FakeOutput, FakeOutput, FakeInput, FakeDelay>;

fn bus(reply: u8, with_reset: bool, dio0: bool) -> (TestBus, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let spi = FakeSpi {
        log: log.clone(),
        reply,
        fail: false,
    };
    let cs = FakeOutput {
        log: log.clone(),
        event: Event::ChipSelect,
    };
    let reset = with_reset.then(|| FakeOutput {
        log: log.clone(),
        event: Event::Reset,
    });
    let bus = SpiRegisterBus::new(spi, cs, reset, FakeInput(dio0), FakeDelay(log.clone())).unwrap();
    (bus, log)
}

fn take(log: &Log) -> Vec<Event> {
    log.borrow_mut().drain(..).collect()
}

#[test]
fn test_new_deselects_chip() {
    let (_bus, log) = bus(0, true, false);

    assert_eq!(take(&log), vec![Event::ChipSelect(true)]);
}

#[test]
fn test_read_register_transaction() {
    let (mut bus, log) = bus(0x12, true, false);
    take(&log);

    assert_eq!(bus.read_register(0x42).unwrap(), 0x12);
    // The read flag is bit 7 clear even when the caller sets it
    assert_eq!(bus.read_register(0xC2).unwrap(), 0x12);

    assert_eq!(
        take(&log),
        vec![
            Event::ChipSelect(false),
            Event::Transfer([0x42, 0x00]),
            Event::ChipSelect(true),
            Event::ChipSelect(false),
            Event::Transfer([0x42, 0x00]),
            Event::ChipSelect(true),
        ]
    );
}

#[test]
fn test_write_register_transaction() {
    let (mut bus, log) = bus(0, true, false);
    take(&log);

    bus.write_register(0x01, 0x85).unwrap();

    assert_eq!(
        take(&log),
        vec![
            Event::ChipSelect(false),
            Event::Write([0x81, 0x85]),
            Event::ChipSelect(true),
        ]
    );
}

#[test]
fn test_spi_failure_releases_chip_select() {
    let (bus, log) = bus(0, true, false);
    let (mut spi, cs, reset, dio0, delay) = bus.release();
    spi.fail = true;
    let mut bus = SpiRegisterBus::new(spi, cs, reset, dio0, delay).unwrap();
    take(&log);

    assert_eq!(bus.read_register(0x42), Err(BusError::Spi));
    assert_eq!(bus.write_register(0x01, 0x80), Err(BusError::Spi));

    let events = take(&log);
    assert_eq!(events.last(), Some(&Event::ChipSelect(true)));
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == Event::ChipSelect(true))
            .count(),
        2
    );
}

#[test]
fn test_reset_line_and_delay() {
    let (mut bus, log) = bus(0, true, false);
    take(&log);

    bus.set_reset_line(true).unwrap();
    bus.delay_ms(100);
    bus.set_reset_line(false).unwrap();

    assert_eq!(
        take(&log),
        vec![Event::Reset(true), Event::Delay(100), Event::Reset(false)]
    );
}

#[test]
fn test_unwired_reset_is_ignored() {
    let (mut bus, log) = bus(0, false, false);
    take(&log);

    bus.set_reset_line(true).unwrap();
    bus.set_reset_line(false).unwrap();

    assert!(take(&log).is_empty());
}

#[test]
fn test_interrupt_line_follows_dio0() {
    let (mut raised, _) = bus(0, true, true);
    let (mut idle, _) = bus(0, true, false);

    assert!(raised.read_interrupt_line().unwrap());
    assert!(!idle.read_interrupt_line().unwrap());
}

#[test]
fn test_release_returns_peripherals() {
    let (bus, _log) = bus(0x22, false, true);

    let (spi, _cs, reset, dio0, _delay) = bus.release();

    assert_eq!(spi.reply, 0x22);
    assert!(reset.is_none());
    assert!(dio0.0);
}
