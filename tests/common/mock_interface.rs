//! Mock transports for testing the CPLD register layer

use device_driver::RegisterInterface;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use switch_cpld::{PortIo, Transport};

/// Records operations performed on a mock chip
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Read register operation
    ReadRegister {
        /// Register offset
        offset: u8,
        /// Value that was returned
        value: u8,
    },
    /// Write register operation
    WriteRegister {
        /// Register offset
        offset: u8,
        /// Value that was written
        value: u8,
    },
}

/// Shared state for mock interface (uses interior mutability)
#[derive(Debug)]
struct MockState {
    /// Simulated register values by offset
    registers: HashMap<u8, u8>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Failure injection
    fail_next_read: bool,
    failing_writes: u32,
}

impl MockState {
    fn new() -> Self {
        Self {
            registers: HashMap::new(),
            operations: Vec::new(),
            fail_next_read: false,
            failing_writes: 0,
        }
    }
}

/// One simulated CPLD
///
/// Clones share state, so a test keeps a handle to inspect what the
/// registry did with its copy.
#[derive(Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
    bus_address: u16,
}

impl MockInterface {
    pub fn new(bus_address: u16) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
            bus_address,
        }
    }

    pub fn set_register(&self, offset: u8, value: u8) {
        self.state.borrow_mut().registers.insert(offset, value);
    }

    pub fn get_register(&self, offset: u8) -> u8 {
        self.state
            .borrow()
            .registers
            .get(&offset)
            .copied()
            .unwrap_or(0)
    }

    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    pub fn fail_next_write(&self) {
        self.fail_writes(1);
    }

    /// Fail the next `count` writes
    pub fn fail_writes(&self, count: u32) {
        self.state.borrow_mut().failing_writes = count;
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    pub fn write_count(&self) -> usize {
        self.state
            .borrow()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::WriteRegister { .. }))
            .count()
    }

    #[allow(dead_code)]
    pub fn read_count(&self) -> usize {
        self.state
            .borrow()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::ReadRegister { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockError {
    Communication,
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }

        for (i, byte) in read_data.iter_mut().enumerate() {
            let offset = address.wrapping_add(i as u8);
            *byte = state.registers.get(&offset).copied().unwrap_or(0);
            state.operations.push(Operation::ReadRegister {
                offset,
                value: *byte,
            });
        }

        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(MockError::Communication);
        }

        for (i, &byte) in write_data.iter().enumerate() {
            let offset = address.wrapping_add(i as u8);
            state.registers.insert(offset, byte);
            state.operations.push(Operation::WriteRegister {
                offset,
                value: byte,
            });
        }

        Ok(())
    }
}

impl Transport for MockInterface {
    fn bus_address(&self) -> u16 {
        self.bus_address
    }
}

/// A simulated I/O port space
#[derive(Clone, Default)]
pub struct MockPortIo {
    ports: Rc<RefCell<HashMap<u16, u8>>>,
    fail_next: Rc<RefCell<bool>>,
}

impl MockPortIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_port(&self, port: u16, value: u8) {
        self.ports.borrow_mut().insert(port, value);
    }

    pub fn get_port(&self, port: u16) -> Option<u8> {
        self.ports.borrow().get(&port).copied()
    }

    pub fn fail_next(&self) {
        *self.fail_next.borrow_mut() = true;
    }

    fn take_failure(&self) -> bool {
        std::mem::take(&mut *self.fail_next.borrow_mut())
    }
}

impl PortIo for MockPortIo {
    type Error = MockError;

    fn read_u8(&mut self, port: u16) -> Result<u8, Self::Error> {
        if self.take_failure() {
            return Err(MockError::Communication);
        }
        Ok(self.get_port(port).unwrap_or(0xff))
    }

    fn write_u8(&mut self, port: u16, value: u8) -> Result<(), Self::Error> {
        if self.take_failure() {
            return Err(MockError::Communication);
        }
        self.set_port(port, value);
        Ok(())
    }
}
