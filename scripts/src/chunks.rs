//! Splitting package payloads into chunks and planning how they are staged
//! through the `LargePackages` module

use std::mem;

use itertools::Itertools;

use crate::errors::ScriptError;

/// Split `data` into consecutive chunks of at most `chunk_size` bytes.
///
/// An empty payload yields a single empty chunk.
pub fn create_chunks(data: &[u8], chunk_size: usize) -> Result<Vec<&[u8]>, ScriptError> {
    if chunk_size == 0 {
        return Err(ScriptError::InvalidChunkSize);
    }

    if data.is_empty() {
        return Ok(vec![data]);
    }

    Ok(data.chunks(chunk_size).collect())
}

/// The metadata and code chunks carried by a single staging transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedChunks {
    /// A chunk of the serialized package metadata, possibly empty
    pub metadata: Vec<u8>,
    /// The module index of each code chunk
    pub code_indices: Vec<u16>,
    /// Chunks of module bytecode
    pub code_chunks: Vec<Vec<u8>>,
}

impl StagedChunks {
    /// A batch carrying only a metadata chunk
    fn metadata_only(metadata: &[u8]) -> Self {
        Self {
            metadata: metadata.to_vec(),
            ..Default::default()
        }
    }

    /// The total number of payload bytes in the batch
    pub fn size(&self) -> usize {
        self.metadata.len() + self.code_chunks.iter().map(Vec::len).sum::<usize>()
    }

    /// Render the batch as arguments of `large_packages::stage_code_chunk`
    pub fn to_cli_args(&self) -> Vec<String> {
        let metadata = if self.metadata.is_empty() {
            "u8:[]".to_string()
        } else {
            format!("hex:0x{}", hex::encode(&self.metadata))
        };
        let indices = format!("u16:[{}]", self.code_indices.iter().join(","));
        let code = format!(
            "hex:[{}]",
            self.code_chunks
                .iter()
                .map(|c| format!("\"0x{}\"", hex::encode(c)))
                .join(",")
        );

        vec![metadata, indices, code]
    }
}

/// The ordered staging transactions needed to publish a package in chunks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingPlan {
    /// Batches submitted through `stage_code_chunk`
    pub staged: Vec<StagedChunks>,
    /// The batch submitted through `stage_code_chunk_and_upgrade_object_code`
    pub finalize: StagedChunks,
}

impl StagingPlan {
    /// Plan the staging of a package's metadata and module bytecode.
    ///
    /// Every metadata chunk but the last is staged on its own. The last one
    /// rides along with the first batch of code chunks; code chunks accumulate
    /// until the next one would push the batch over `chunk_size`. Whatever
    /// remains at the end forms the finalizing batch.
    pub fn new(
        metadata: &[u8],
        modules: &[Vec<u8>],
        chunk_size: usize,
    ) -> Result<Self, ScriptError> {
        let mut metadata_chunks = create_chunks(metadata, chunk_size)?;
        let last_metadata_chunk = metadata_chunks.pop().unwrap_or_default();

        let mut staged = metadata_chunks
            .into_iter()
            .map(StagedChunks::metadata_only)
            .collect_vec();

        let mut batch = StagedChunks::metadata_only(last_metadata_chunk);
        for (idx, module) in modules.iter().enumerate() {
            let idx = u16::try_from(idx).map_err(|_| {
                ScriptError::Payload(format!("module index {idx} does not fit in a u16"))
            })?;

            for chunk in create_chunks(module, chunk_size)? {
                if chunk.is_empty() {
                    continue;
                }

                if batch.size() + chunk.len() > chunk_size {
                    staged.push(mem::take(&mut batch));
                }

                batch.code_indices.push(idx);
                batch.code_chunks.push(chunk.to_vec());
            }
        }

        Ok(Self {
            staged,
            finalize: batch,
        })
    }

    /// The number of multisig transactions the plan submits
    pub fn num_transactions(&self) -> usize {
        self.staged.len() + 1
    }
}
