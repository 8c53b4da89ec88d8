use std::time::{Duration, Instant};

use log::{error, info};
use structopt::StructOpt;

use serial_lcd_protocol::{
    AutoRepeat, DeviceProfile, Direction, ModuleType, Session, GLYPH_ROWS, GPO1, GPO3,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "keypad")]
struct Opt {
    /// Serial port the display is attached to
    #[structopt(short, long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate (9600, 19200, 38400 or 57600)
    #[structopt(short, long, default_value = "19200")]
    baud: u32,

    /// Module type: lcd, lkd, vfd or vkd
    #[structopt(short, long, default_value = "lkd")]
    module: ModuleType,

    /// Display columns
    #[structopt(long, default_value = "20")]
    width: u8,

    /// Display rows
    #[structopt(long, default_value = "4")]
    height: u8,

    /// How long to wait for key presses, in seconds
    #[structopt(short, long, default_value = "30")]
    seconds: u64,

    /// Turn on verbose messages
    #[structopt(short, long)]
    verbose: bool,
}

const HEART: [u8; GLYPH_ROWS] = [0x00, 0x0a, 0x1f, 0x1f, 0x0e, 0x04, 0x00, 0x00];

fn main() {
    let opt = Opt::from_args();

    simple_logger::init().unwrap();
    if opt.verbose {
        println!("{:#?}", opt);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    let profile = DeviceProfile::new(opt.module, &opt.port)
        .with_size(opt.width, opt.height)
        .with_baud_rate(opt.baud);

    let mut lcd = match Session::open(&profile) {
        Ok(lcd) => lcd,
        Err(e) => {
            error!("Unable to open {}: {}", opt.port, e);
            std::process::exit(1);
        }
    };
    info!("Connection established");

    lcd.set_key_auto_tx(true);
    lcd.set_key_auto_repeat(AutoRepeat::Hold);
    lcd.backlight_on(0);

    lcd.set_cursor(3, 1);
    lcd.put_str("System Failure");

    lcd.define_glyph(0, &HEART);
    lcd.set_cursor(5, 3);
    lcd.put_char(0);
    lcd.set_cursor(14, 3);
    lcd.put_char(0);

    lcd.hbar(0, 0, 50, Direction::Right);
    lcd.set_outputs(GPO1 | GPO3);
    lcd.set_cursor_block(true);

    let deadline = Instant::now() + Duration::from_secs(opt.seconds);
    let mut key = [0u8; 1];
    while Instant::now() < deadline {
        match lcd.read(&mut key, Duration::from_millis(100)) {
            Ok(0) => {}
            Ok(_) => println!("Key pressed on display: '{}' (0x{:02x})", key[0] as char, key[0]),
            Err(e) => {
                error!("Read failed: {}", e);
                break;
            }
        }
    }

    match lcd.close() {
        Ok(()) => info!("Connection closed"),
        Err(e) => error!("{}", e),
    }
}
