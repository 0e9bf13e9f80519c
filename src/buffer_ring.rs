use crate::agent::{AgentRecord, AGENT_STRIDE};
use crate::errors::PhysarumError;
use log::debug;
use std::sync::Arc;

/// The three agent-table buffers and the per-step handoff between them.
///
/// `output` is what the agent kernel writes, `readback` is the mappable
/// staging copy, and `source` is what the next dispatch reads. The host
/// round trip through `advance()` is the synchronization point that keeps a
/// sub-step from ever observing its own in-flight writes.
pub struct BufferRing {
    output: wgpu::Buffer,
    readback: wgpu::Buffer,
    source: wgpu::Buffer,
    size: wgpu::BufferAddress,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl BufferRing {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>, agent_count: u32) -> Self {
        let size = agent_count as wgpu::BufferAddress * AGENT_STRIDE;

        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Agent Output Buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Agent Readback Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let source = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Agent Source Buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        debug!("created agent buffer ring, {} bytes per region", size);

        Self {
            output,
            readback,
            source,
            size,
            device,
            queue,
        }
    }

    /// Writes the freshly seeded population into the source buffer. Host
    /// code never touches agent state again except through `advance()`.
    pub fn upload_seed(&self, agents: &[AgentRecord]) {
        self.queue
            .write_buffer(&self.source, 0, bytemuck::cast_slice(agents));
    }

    pub fn source(&self) -> &wgpu::Buffer {
        &self.source
    }

    pub fn output(&self) -> &wgpu::Buffer {
        &self.output
    }

    /// Moves the agent table forward one sub-step: copy the kernel's output
    /// into staging, block until the bytes are host-visible, and upload them
    /// unchanged into the source buffer for the next dispatch. Blocking here
    /// is the point; the next sub-step must see exactly these bytes.
    pub fn advance(&self) -> Result<(), PhysarumError> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Agent Round Trip Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.output, 0, &self.readback, 0, self.size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let bytes = self.map_staging()?;
        self.queue.write_buffer(&self.source, 0, &bytes);

        Ok(())
    }

    /// Reads the source buffer's current contents back to the host. Test
    /// support for the byte-equality guarantee; not on the per-frame path.
    pub fn read_source(&self) -> Result<Vec<u8>, PhysarumError> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Agent Source Snapshot Encoder"),
            });
        encoder.copy_buffer_to_buffer(&self.source, 0, &self.readback, 0, self.size);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.map_staging()
    }

    fn map_staging(&self) -> Result<Vec<u8>, PhysarumError> {
        let buffer_slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| PhysarumError::Dispatch(format!("readback channel closed: {}", e)))?
            .map_err(|e| {
                PhysarumError::Dispatch(format!("failed to map agent staging buffer: {}", e))
            })?;

        let data = buffer_slice.get_mapped_range();
        let bytes = data.to_vec();
        drop(data);
        self.readback.unmap();

        Ok(bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn gpu() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
        let instance = wgpu::Instance::default();
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None))
                .ok()?;
        Some((Arc::new(device), Arc::new(queue)))
    }

    fn pattern(count: u32) -> Vec<AgentRecord> {
        (0..count)
            .map(|i| AgentRecord {
                x: i as f32,
                y: i as f32 * 2.0,
                heading: 0.25 * i as f32,
                species: i % 4,
                alive: 1.0,
            })
            .collect()
    }

    #[test]
    fn advance_round_trips_output_bytes_into_the_source_buffer() {
        let Some((device, queue)) = gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let ring = BufferRing::new(device, queue.clone(), 64);

        // Stand in for an agent-update dispatch by writing a recognizable
        // pattern into the output region.
        let written = pattern(64);
        queue.write_buffer(ring.output(), 0, bytemuck::cast_slice(&written));

        ring.advance().unwrap();

        let uploaded = ring.read_source().unwrap();
        assert_eq!(uploaded, bytemuck::cast_slice::<_, u8>(&written).to_vec());
    }

    #[test]
    fn upload_seed_lands_byte_for_byte_in_the_source_buffer() {
        let Some((device, queue)) = gpu() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };
        let ring = BufferRing::new(device, queue, 32);

        let seeded = pattern(32);
        ring.upload_seed(&seeded);

        let uploaded = ring.read_source().unwrap();
        assert_eq!(uploaded, bytemuck::cast_slice::<_, u8>(&seeded).to_vec());
    }
}
