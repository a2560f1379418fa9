use super::cartridge::{Cartridge, RomError};

/// Nametable wiring selected by the cartridge (and, for MMC1/MMC3,
/// rewritten at runtime through mapper registers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenA,
    SingleScreenB,
    FourScreen,
}

/// Cartridge hardware as a tagged variant. Each variant owns its PRG/CHR/
/// SRAM data and register state inline; dispatch is a match, so a missing
/// arm is a compile error rather than a runtime surprise.
pub enum Mapper {
    Nrom(Nrom),
    Mmc1(Mmc1),
    UxRom(UxRom),
    CnRom(CnRom),
    Mmc3(Mmc3),
}

impl Mapper {
    pub fn from_cartridge(cart: Cartridge) -> Result<Self, RomError> {
        match cart.mapper_id {
            0 => Ok(Mapper::Nrom(Nrom::new(cart))),
            1 => Ok(Mapper::Mmc1(Mmc1::new(cart))),
            2 => Ok(Mapper::UxRom(UxRom::new(cart))),
            3 => Ok(Mapper::CnRom(CnRom::new(cart))),
            4 => Ok(Mapper::Mmc3(Mmc3::new(cart))),
            id => Err(RomError::UnsupportedMapper(id)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mapper::Nrom(_) => "NROM",
            Mapper::Mmc1(_) => "MMC1",
            Mapper::UxRom(_) => "UxROM",
            Mapper::CnRom(_) => "CNROM",
            Mapper::Mmc3(_) => "MMC3",
        }
    }

    /// CPU-side read, $6000-$FFFF (SRAM window plus banked PRG).
    pub fn prg_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.prg_read(addr),
            Mapper::Mmc1(m) => m.prg_read(addr),
            Mapper::UxRom(m) => m.prg_read(addr),
            Mapper::CnRom(m) => m.prg_read(addr),
            Mapper::Mmc3(m) => m.prg_read(addr),
        }
    }

    pub fn prg_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::Nrom(m) => m.prg_write(addr, value),
            Mapper::Mmc1(m) => m.prg_write(addr, value),
            Mapper::UxRom(m) => m.prg_write(addr, value),
            Mapper::CnRom(m) => m.prg_write(addr, value),
            Mapper::Mmc3(m) => m.prg_write(addr, value),
        }
    }

    /// PPU-side read of the pattern area, $0000-$1FFF.
    pub fn chr_read(&self, addr: u16) -> u8 {
        match self {
            Mapper::Nrom(m) => m.chr_read(addr),
            Mapper::Mmc1(m) => m.chr_read(addr),
            Mapper::UxRom(m) => m.chr_read(addr),
            Mapper::CnRom(m) => m.chr_read(addr),
            Mapper::Mmc3(m) => m.chr_read(addr),
        }
    }

    pub fn chr_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::Nrom(m) => m.chr_write(addr, value),
            Mapper::Mmc1(m) => m.chr_write(addr, value),
            Mapper::UxRom(m) => m.chr_write(addr, value),
            Mapper::CnRom(m) => m.chr_write(addr, value),
            Mapper::Mmc3(m) => m.chr_write(addr, value),
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        match self {
            Mapper::Nrom(m) => m.mirroring,
            Mapper::Mmc1(m) => m.mirroring(),
            Mapper::UxRom(m) => m.mirroring,
            Mapper::CnRom(m) => m.mirroring,
            Mapper::Mmc3(m) => m.mirroring(),
        }
    }

    /// Every address the PPU puts on its bus is reported here; MMC3 watches
    /// A12 edges for its scanline counter, everyone else ignores it.
    pub fn notify_chr_addr(&mut self, addr: u16) {
        if let Mapper::Mmc3(m) = self {
            m.monitor_a12(addr);
        }
    }

    pub fn irq_pending(&self) -> bool {
        match self {
            Mapper::Mmc3(m) => m.irq_pending,
            _ => false,
        }
    }

    pub fn irq_ack(&mut self) {
        if let Mapper::Mmc3(m) = self {
            m.irq_pending = false;
        }
    }
}

pub struct Nrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    sram: Vec<u8>,
    mirroring: Mirroring,
}

impl Nrom {
    fn new(cart: Cartridge) -> Self {
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr_data,
            chr_is_ram: cart.chr_is_ram,
            sram: vec![0; cart.sram_size],
            mirroring: cart.mirroring,
        }
    }

    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr as usize - 0x6000) % self.sram.len()],
            0x8000..=0xFFFF => {
                let mut idx = addr as usize - 0x8000;
                if self.prg_rom.len() == 0x4000 {
                    idx %= 0x4000;
                }
                self.prg_rom[idx % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, value: u8) {
        if (0x6000..=0x7FFF).contains(&addr) {
            let idx = (addr as usize - 0x6000) % self.sram.len();
            self.sram[idx] = value;
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[(addr as usize) % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let idx = (addr as usize) % self.chr.len();
            self.chr[idx] = value;
        }
    }
}

pub struct Mmc1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    sram: Vec<u8>,

    shift_register: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mmc1 {
    fn new(cart: Cartridge) -> Self {
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr_data,
            chr_is_ram: cart.chr_is_ram,
            sram: vec![0; cart.sram_size],
            shift_register: 0x10,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    fn prg_bank_count_16k(&self) -> usize {
        (self.prg_rom.len() / 0x4000).max(1)
    }

    fn chr_bank_count_4k(&self) -> usize {
        (self.chr.len() / 0x1000).max(1)
    }

    fn read_prg_bank(&self, bank: usize, offset: usize) -> u8 {
        let bank = bank % self.prg_bank_count_16k();
        self.prg_rom[(bank * 0x4000 + offset) % self.prg_rom.len()]
    }

    /// Serial loading port: bit 7 resets the shift register and forces the
    /// fixed-last PRG mode; otherwise one bit enters from the right and the
    /// fifth write commits to the register picked by address bits 13-14.
    fn write_shift_register(&mut self, addr: u16, value: u8) {
        if (value & 0x80) != 0 {
            self.shift_register = 0x10;
            self.control |= 0x0C;
            return;
        }

        let commit = (self.shift_register & 0x01) != 0;
        self.shift_register >>= 1;
        self.shift_register |= (value & 0x01) << 4;

        if commit {
            let data = self.shift_register;
            match (addr >> 13) & 0x03 {
                0 => self.control = data,
                1 => self.chr_bank0 = data,
                2 => self.chr_bank1 = data,
                _ => self.prg_bank = data & 0x0F,
            }
            self.shift_register = 0x10;
        }
    }

    fn chr_index(&self, addr: u16) -> usize {
        let addr = addr as usize;
        if (self.control & 0x10) == 0 {
            // 8 KiB mode: low bit of the bank number is ignored.
            let bank = (self.chr_bank0 as usize & 0x1E) % self.chr_bank_count_4k();
            (bank * 0x1000 + addr) % self.chr.len()
        } else if addr < 0x1000 {
            let bank = (self.chr_bank0 as usize) % self.chr_bank_count_4k();
            (bank * 0x1000 + addr) % self.chr.len()
        } else {
            let bank = (self.chr_bank1 as usize) % self.chr_bank_count_4k();
            (bank * 0x1000 + (addr - 0x1000)) % self.chr.len()
        }
    }

    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr as usize - 0x6000) % self.sram.len()],
            0x8000..=0xFFFF => {
                let mode = (self.control >> 2) & 0x03;
                let bank = self.prg_bank as usize;
                let offset_16k = (addr as usize) & 0x3FFF;
                match mode {
                    0 | 1 => {
                        let bank32 = bank & !1;
                        let idx = bank32 * 0x4000 + (addr as usize - 0x8000);
                        self.prg_rom[idx % self.prg_rom.len()]
                    }
                    2 => {
                        if addr < 0xC000 {
                            self.read_prg_bank(0, offset_16k)
                        } else {
                            self.read_prg_bank(bank, offset_16k)
                        }
                    }
                    _ => {
                        if addr < 0xC000 {
                            self.read_prg_bank(bank, offset_16k)
                        } else {
                            self.read_prg_bank(self.prg_bank_count_16k() - 1, offset_16k)
                        }
                    }
                }
            }
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                let idx = (addr as usize - 0x6000) % self.sram.len();
                self.sram[idx] = value;
            }
            0x8000..=0xFFFF => self.write_shift_register(addr, value),
            _ => {}
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[self.chr_index(addr)]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let idx = self.chr_index(addr);
            self.chr[idx] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self.control & 0x03 {
            0 => Mirroring::SingleScreenA,
            1 => Mirroring::SingleScreenB,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}

pub struct UxRom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    sram: Vec<u8>,
    bank_select: u8,
    mirroring: Mirroring,
}

impl UxRom {
    fn new(cart: Cartridge) -> Self {
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr_data,
            chr_is_ram: cart.chr_is_ram,
            sram: vec![0; cart.sram_size],
            bank_select: 0,
            mirroring: cart.mirroring,
        }
    }

    fn prg_banks(&self) -> usize {
        (self.prg_rom.len() / 0x4000).max(1)
    }

    fn read_bank(&self, bank: usize, offset: usize) -> u8 {
        let bank = bank % self.prg_banks();
        self.prg_rom[bank * 0x4000 + offset]
    }

    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr as usize - 0x6000) % self.sram.len()],
            0x8000..=0xBFFF => self.read_bank(self.bank_select as usize, addr as usize - 0x8000),
            0xC000..=0xFFFF => self.read_bank(self.prg_banks() - 1, addr as usize - 0xC000),
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                let idx = (addr as usize - 0x6000) % self.sram.len();
                self.sram[idx] = value;
            }
            0x8000..=0xFFFF => self.bank_select = value & 0x0F,
            _ => {}
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[(addr as usize) % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let idx = (addr as usize) % self.chr.len();
            self.chr[idx] = value;
        }
    }
}

pub struct CnRom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    sram: Vec<u8>,
    chr_bank_select: u8,
    mirroring: Mirroring,
}

impl CnRom {
    fn new(cart: Cartridge) -> Self {
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr_data,
            chr_is_ram: cart.chr_is_ram,
            sram: vec![0; cart.sram_size],
            chr_bank_select: 0,
            mirroring: cart.mirroring,
        }
    }

    fn chr_bank_count(&self) -> usize {
        (self.chr.len() / 0x2000).max(1)
    }

    fn chr_index(&self, addr: u16) -> usize {
        let bank = (self.chr_bank_select as usize) % self.chr_bank_count();
        (bank * 0x2000 + (addr as usize & 0x1FFF)) % self.chr.len()
    }

    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr as usize - 0x6000) % self.sram.len()],
            0x8000..=0xFFFF => {
                let mut idx = addr as usize - 0x8000;
                if self.prg_rom.len() == 0x4000 {
                    idx %= 0x4000;
                }
                self.prg_rom[idx % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                let idx = (addr as usize - 0x6000) % self.sram.len();
                self.sram[idx] = value;
            }
            0x8000..=0xFFFF => self.chr_bank_select = value & 0x03,
            _ => {}
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[self.chr_index(addr)]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let idx = self.chr_index(addr);
            self.chr[idx] = value;
        }
    }
}

pub struct Mmc3 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    sram: Vec<u8>,
    bank_select: u8,
    bank_regs: [u8; 8],
    mirroring: Mirroring,
    four_screen: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
    last_a12: bool,
    a12_low_dots: u8,
}

impl Mmc3 {
    fn new(cart: Cartridge) -> Self {
        let four_screen = cart.mirroring == Mirroring::FourScreen;
        Self {
            prg_rom: cart.prg_rom,
            chr: cart.chr_data,
            chr_is_ram: cart.chr_is_ram,
            sram: vec![0; cart.sram_size],
            bank_select: 0,
            bank_regs: [0; 8],
            mirroring: cart.mirroring,
            four_screen,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            last_a12: false,
            a12_low_dots: 0,
        }
    }

    fn prg_bank_count_8k(&self) -> usize {
        (self.prg_rom.len() / 0x2000).max(1)
    }

    fn chr_bank_count_1k(&self) -> usize {
        (self.chr.len() / 0x0400).max(1)
    }

    fn read_prg_bank_8k(&self, bank: usize, offset: usize) -> u8 {
        let bank = bank % self.prg_bank_count_8k();
        self.prg_rom[(bank * 0x2000 + offset) % self.prg_rom.len()]
    }

    fn chr_index(&self, addr: u16) -> usize {
        let r0 = self.bank_regs[0] & 0xFE;
        let r1 = self.bank_regs[1] & 0xFE;
        let [r2, r3, r4, r5] = [
            self.bank_regs[2],
            self.bank_regs[3],
            self.bank_regs[4],
            self.bank_regs[5],
        ];

        // Bit 7 of bank-select swaps the 2 KiB and 1 KiB halves.
        let banks = if (self.bank_select & 0x80) == 0 {
            [
                r0,
                r0.wrapping_add(1),
                r1,
                r1.wrapping_add(1),
                r2,
                r3,
                r4,
                r5,
            ]
        } else {
            [
                r2,
                r3,
                r4,
                r5,
                r0,
                r0.wrapping_add(1),
                r1,
                r1.wrapping_add(1),
            ]
        };

        let slot = (addr as usize & 0x1FFF) / 0x0400;
        let bank = banks[slot] as usize % self.chr_bank_count_1k();
        (bank * 0x0400 + (addr as usize & 0x03FF)) % self.chr.len()
    }

    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter = self.irq_counter.wrapping_sub(1);
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    /// IRQ counter clocks on A12 rising edges that follow a sustained low
    /// period, filtering the rapid toggling inside a single tile fetch.
    fn monitor_a12(&mut self, addr: u16) {
        let a12 = (addr & 0x1000) != 0;
        if !a12 {
            self.a12_low_dots = self.a12_low_dots.saturating_add(1);
        } else {
            if !self.last_a12 && self.a12_low_dots >= 8 {
                self.clock_irq_counter();
            }
            self.a12_low_dots = 0;
        }
        self.last_a12 = a12;
    }

    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.sram[(addr as usize - 0x6000) % self.sram.len()],
            0x8000..=0xFFFF => {
                let prg_mode = (self.bank_select >> 6) & 0x01;
                let last = self.prg_bank_count_8k() - 1;
                let second_last = self.prg_bank_count_8k().saturating_sub(2);

                let offset = (addr as usize) & 0x1FFF;
                let bank = match addr {
                    0x8000..=0x9FFF => {
                        if prg_mode == 0 {
                            self.bank_regs[6] as usize
                        } else {
                            second_last
                        }
                    }
                    0xA000..=0xBFFF => self.bank_regs[7] as usize,
                    0xC000..=0xDFFF => {
                        if prg_mode == 0 {
                            second_last
                        } else {
                            self.bank_regs[6] as usize
                        }
                    }
                    _ => last,
                };

                self.read_prg_bank_8k(bank, offset)
            }
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                let idx = (addr as usize - 0x6000) % self.sram.len();
                self.sram[idx] = value;
            }
            0x8000..=0x9FFF => {
                if (addr & 1) == 0 {
                    self.bank_select = value;
                } else {
                    let target = (self.bank_select & 0x07) as usize;
                    self.bank_regs[target] = if target <= 1 { value & 0xFE } else { value };
                }
            }
            0xA000..=0xBFFF => {
                if (addr & 1) == 0 && !self.four_screen {
                    self.mirroring = if (value & 1) == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                }
            }
            0xC000..=0xDFFF => {
                if (addr & 1) == 0 {
                    self.irq_latch = value;
                } else {
                    self.irq_reload = true;
                }
            }
            0xE000..=0xFFFF => {
                if (addr & 1) == 0 {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[self.chr_index(addr)]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            let idx = self.chr_index(addr);
            self.chr[idx] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        if self.four_screen {
            Mirroring::FourScreen
        } else {
            self.mirroring
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned_banks(total_size: usize, bank_size: usize) -> Vec<u8> {
        let mut data = vec![0u8; total_size];
        for (bank, chunk) in data.chunks_mut(bank_size).enumerate() {
            chunk.fill((bank as u8).wrapping_add(1));
        }
        data
    }

    fn make_cart(mapper_id: u8, prg_rom: Vec<u8>, chr_data: Vec<u8>, chr_is_ram: bool) -> Cartridge {
        Cartridge {
            mapper_id,
            mirroring: Mirroring::Horizontal,
            has_battery_backed_ram: false,
            prg_rom,
            chr_data,
            chr_is_ram,
            sram_size: 8 * 1024,
        }
    }

    fn mmc1_serial_write(mapper: &mut Mapper, addr: u16, value: u8) {
        for bit in 0..5 {
            mapper.prg_write(addr, (value >> bit) & 0x01);
        }
    }

    #[test]
    fn unsupported_mapper_is_rejected() {
        let cart = make_cart(7, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], false);
        assert!(matches!(
            Mapper::from_cartridge(cart),
            Err(RomError::UnsupportedMapper(7))
        ));
    }

    #[test]
    fn nrom_mirrors_16k_prg() {
        let cart = make_cart(0, patterned_banks(0x4000, 0x4000), vec![0; 0x2000], false);
        let mapper = Mapper::from_cartridge(cart).unwrap();
        assert_eq!(mapper.prg_read(0x8000), mapper.prg_read(0xC000));
        assert_eq!(mapper.prg_read(0x9234), mapper.prg_read(0xD234));
    }

    #[test]
    fn nrom_ignores_prg_writes() {
        let cart = make_cart(0, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], false);
        let mut mapper = Mapper::from_cartridge(cart).unwrap();
        let before = mapper.prg_read(0x8000);
        mapper.prg_write(0x8000, 0xFF);
        assert_eq!(mapper.prg_read(0x8000), before);
    }

    #[test]
    fn sram_round_trips() {
        let cart = make_cart(0, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], false);
        let mut mapper = Mapper::from_cartridge(cart).unwrap();
        mapper.prg_write(0x6123, 0x5A);
        assert_eq!(mapper.prg_read(0x6123), 0x5A);
    }

    #[test]
    fn uxrom_keeps_last_bank_fixed() {
        let cart = make_cart(2, patterned_banks(3 * 0x4000, 0x4000), vec![0; 0x2000], true);
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mapper.prg_write(0x8000, 1);
        assert_eq!(mapper.prg_read(0x8000), 2);
        assert_eq!(mapper.prg_read(0xC000), 3);

        mapper.prg_write(0x8000, 0);
        assert_eq!(mapper.prg_read(0x8000), 1);
        assert_eq!(mapper.prg_read(0xC000), 3);
    }

    #[test]
    fn cnrom_switches_chr_bank_from_low_two_bits() {
        let cart = make_cart(
            3,
            patterned_banks(0x8000, 0x4000),
            patterned_banks(4 * 0x2000, 0x2000),
            false,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mapper.prg_write(0x8000, 1);
        assert_eq!(mapper.chr_read(0x0000), 2);
        // Upper bits of the written value are ignored.
        mapper.prg_write(0x8000, 0xFE);
        assert_eq!(mapper.chr_read(0x0000), 3);
    }

    #[test]
    fn cnrom_allows_chr_ram_writes_when_present() {
        let cart = make_cart(3, patterned_banks(0x8000, 0x4000), vec![0; 2 * 0x2000], true);
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mapper.prg_write(0x8000, 1);
        mapper.chr_write(0x0010, 0xAB);
        assert_eq!(mapper.chr_read(0x0010), 0xAB);
    }

    #[test]
    fn mmc1_commits_after_five_writes() {
        let cart = make_cart(
            1,
            patterned_banks(4 * 0x4000, 0x4000),
            vec![0; 0x2000],
            true,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        // Control: PRG mode 3 (switch first, fix last), vertical mirroring.
        mmc1_serial_write(&mut mapper, 0x8000, 0x0E);
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);

        mmc1_serial_write(&mut mapper, 0xE000, 0x02);
        assert_eq!(mapper.prg_read(0x8000), 3);
        assert_eq!(mapper.prg_read(0xC000), 4);
    }

    #[test]
    fn mmc1_reset_bit_restores_shift_and_control() {
        let cart = make_cart(
            1,
            patterned_banks(4 * 0x4000, 0x4000),
            vec![0; 0x2000],
            true,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        // Select PRG mode 0 (32 KiB switching), then shift in two bits of a
        // would-be register write before aborting with bit 7.
        mmc1_serial_write(&mut mapper, 0x8000, 0x00);
        mapper.prg_write(0xE000, 0x01);
        mapper.prg_write(0xE000, 0x01);
        mapper.prg_write(0x9000, 0x80);

        // Control regained its fixed-last PRG mode, and the interrupted
        // sequence left no partial state: five fresh writes commit normally.
        assert_eq!(mapper.prg_read(0xC000), 4);
        mmc1_serial_write(&mut mapper, 0xE000, 0x01);
        assert_eq!(mapper.prg_read(0x8000), 2);
    }

    #[test]
    fn mmc1_single_screen_mirroring_modes() {
        let cart = make_cart(1, patterned_banks(0x8000, 0x4000), vec![0; 0x2000], true);
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mmc1_serial_write(&mut mapper, 0x8000, 0x00);
        assert_eq!(mapper.mirroring(), Mirroring::SingleScreenA);
        mmc1_serial_write(&mut mapper, 0x8000, 0x01);
        assert_eq!(mapper.mirroring(), Mirroring::SingleScreenB);
        mmc1_serial_write(&mut mapper, 0x8000, 0x03);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn mmc3_prg_mode_swaps_switchable_window() {
        let cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        // R6 = bank 1, mode 0: $8000 switchable, $C000 second-to-last.
        mapper.prg_write(0x8000, 0x06);
        mapper.prg_write(0x8001, 0x01);
        assert_eq!(mapper.prg_read(0x8000), 2);
        assert_eq!(mapper.prg_read(0xC000), 3);
        assert_eq!(mapper.prg_read(0xE000), 4);

        // Mode 1 swaps the two windows.
        mapper.prg_write(0x8000, 0x46);
        assert_eq!(mapper.prg_read(0x8000), 3);
        assert_eq!(mapper.prg_read(0xC000), 2);
    }

    #[test]
    fn mmc3_mirroring_register() {
        let cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mapper.prg_write(0xA000, 0x00);
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
        mapper.prg_write(0xA000, 0x01);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn mmc3_irq_counts_filtered_a12_edges() {
        let cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mapper.prg_write(0xC000, 0x01); // latch = 1
        mapper.prg_write(0xC001, 0x00); // reload on next clock
        mapper.prg_write(0xE001, 0x00); // enable

        // First filtered edge reloads the counter from the latch.
        for _ in 0..8 {
            mapper.notify_chr_addr(0x0000);
        }
        mapper.notify_chr_addr(0x1000);
        assert!(!mapper.irq_pending());

        // Second filtered edge decrements 1 -> 0 and raises the IRQ.
        for _ in 0..8 {
            mapper.notify_chr_addr(0x0000);
        }
        mapper.notify_chr_addr(0x1000);
        assert!(mapper.irq_pending());

        mapper.irq_ack();
        assert!(!mapper.irq_pending());
    }

    #[test]
    fn mmc3_rapid_a12_toggle_is_filtered() {
        let cart = make_cart(
            4,
            patterned_banks(4 * 0x2000, 0x2000),
            patterned_banks(8 * 0x0400, 0x0400),
            false,
        );
        let mut mapper = Mapper::from_cartridge(cart).unwrap();

        mapper.prg_write(0xC000, 0x00);
        mapper.prg_write(0xC001, 0x00);
        mapper.prg_write(0xE001, 0x00);

        // Alternating every dot never satisfies the 8-dot low requirement.
        for _ in 0..64 {
            mapper.notify_chr_addr(0x0000);
            mapper.notify_chr_addr(0x1000);
        }
        assert!(!mapper.irq_pending());
    }
}
