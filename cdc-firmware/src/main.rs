//! CDC Control - motion and sensor command controller firmware
//!
//! Drives a height stage (stepper + limit switch), a tilt servo and a
//! sensor head (DS18B20, VL6180X) from a line-based serial console on
//! RP2040 boards.
//!
//! Pin assignments:
//!
//! | Function         | GPIO |
//! |------------------|------|
//! | UART0 TX / RX    | 0 / 1 |
//! | Servo PWM (1A)   | 2    |
//! | Limit switch     | 4    |
//! | DS18B20 data     | 5    |
//! | I2C0 SDA / SCL   | 8 / 9 |
//! | Stepper DIR      | 10   |
//! | Stepper STEP     | 11   |
//! | Stepper ENABLE   | 12   |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, OutputOpenDrain, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{self, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cdc_core::{Controller, Hardware};
use cdc_drivers::console::IoConsole;
use cdc_drivers::sensor::{Ds18b20, GpioLimitSwitch, OneWire, Vl6180x};
use cdc_drivers::servo::{PwmServo, DEFAULT_PERIOD_US};
use cdc_drivers::stepper::StepDirStepper;

mod config;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Console poll period while idle
const IDLE_POLL_MS: u64 = 1;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("CDC Control firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();

    // Console on UART0, 115200 8N1
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let console = IoConsole::new(uart);
    info!("UART initialized");

    let stepper = StepDirStepper::new(
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_12, Level::High),
        config.axis.enable_active_low,
        config.axis.positive_dir_high,
    );

    // 1 MHz PWM tick, 20 ms frame
    let mut pwm_config = pwm::Config::default();
    pwm_config.divider = 125u8.into();
    pwm_config.top = DEFAULT_PERIOD_US - 1;
    let (servo_channel, _) = Pwm::new_output_a(p.PWM_SLICE1, p.PIN_2, pwm_config).split();
    let Some(servo_channel) = servo_channel else {
        error!("Servo PWM channel unavailable");
        return;
    };
    let servo = PwmServo::new(servo_channel, DEFAULT_PERIOD_US);

    let limit_pull = if config.homing.limit_active_low {
        Pull::Up
    } else {
        Pull::Down
    };
    let limit = GpioLimitSwitch::new(
        Input::new(p.PIN_4, limit_pull),
        config.homing.limit_active_low,
    );

    let Ok(one_wire) = OneWire::new(OutputOpenDrain::new(p.PIN_5, Level::High), Delay) else {
        error!("One-wire bus unavailable");
        return;
    };
    let thermometer = Ds18b20::new(one_wire);

    let i2c = I2c::new_blocking(p.I2C0, p.PIN_9, p.PIN_8, i2c::Config::default());
    let mut ranger = Vl6180x::new(i2c, Delay);
    match ranger.init() {
        Ok(()) => info!("VL6180X ready"),
        Err(e) => warn!("VL6180X init failed: {}, readings will use fallback", e),
    }

    let mut controller = Controller::new(
        config,
        Hardware {
            stepper,
            servo,
            limit,
            thermometer,
            ranger,
            console,
            delay: Delay,
        },
    );
    controller.start();
    info!("Controller running");

    loop {
        controller.poll_all();
        Timer::after_millis(IDLE_POLL_MS).await;
    }
}
